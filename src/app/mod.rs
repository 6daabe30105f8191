//! Sample application served by the `rpc-middleware` binary.

pub mod calculator;
pub mod log_interceptor;

pub use calculator::Calculator;
pub use log_interceptor::LogInterceptor;

use crate::model::Method;
use crate::registry::{Operation, OperationDescriptor, ParamKind, RegistrationError};

/// Every operation of the sample application.
pub fn operations() -> Result<Vec<OperationDescriptor>, RegistrationError> {
    Ok(vec![
        Operation::route(Method::Get, "/soma")
            .param("a", ParamKind::Integer)
            .param("b", ParamKind::Integer)
            .before::<LogInterceptor>()
            .after::<LogInterceptor>()
            .invoke(Calculator::invoke_soma)
            .build()?,
        Operation::route(Method::Post, "/echo")
            .param("mensagem", ParamKind::String)
            .invoke(Calculator::invoke_echo)
            .build()?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::model::Request;

    fn dispatcher() -> Dispatcher {
        let dispatcher = Dispatcher::new();
        dispatcher.register_all(operations().unwrap());
        dispatcher
    }

    #[test]
    fn registers_both_routes() {
        let dispatcher = dispatcher();
        let keys: Vec<String> = dispatcher
            .registry()
            .keys()
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, ["GET:/soma", "POST:/echo"]);
    }

    #[test]
    fn soma_accepts_values_beyond_32_bits() {
        let dispatcher = dispatcher();
        let sum = Request::new(Method::Get, "/soma")
            .with_param("a", "3000000000")
            .with_param("b", "1");
        assert_eq!(dispatcher.dispatch(&sum).unwrap().body, "3000000001");

        let overflow = Request::new(Method::Get, "/soma")
            .with_param("a", "9223372036854775807")
            .with_param("b", "1");
        assert_eq!(dispatcher.dispatch(&overflow).unwrap().status_code, 500);
    }

    #[test]
    fn soma_and_echo_respond() {
        let dispatcher = dispatcher();

        let sum = Request::new(Method::Get, "/soma")
            .with_param("a", "5")
            .with_param("b", "10");
        assert_eq!(dispatcher.dispatch(&sum).unwrap().body, "15");

        let echo = Request::new(Method::Post, "/echo").with_param("mensagem", "oi");
        assert_eq!(dispatcher.dispatch(&echo).unwrap().body, "Você disse: oi");
    }

    #[test]
    fn calculator_is_built_once() {
        let dispatcher = dispatcher();
        let sum = Request::new(Method::Get, "/soma")
            .with_param("a", "1")
            .with_param("b", "2");
        let echo = Request::new(Method::Post, "/echo").with_param("mensagem", "x");

        dispatcher.dispatch(&sum).unwrap();
        dispatcher.dispatch(&echo).unwrap();
        assert_eq!(dispatcher.handlers().len(), 1);
    }
}
