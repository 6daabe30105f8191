//! Calculator controller: `GET /soma` and `POST /echo`.

use crate::dispatch::{Arguments, InvokeError};
use crate::lifecycle::{BoxError, Controller};

/// Stateless calculator handler.
#[derive(Debug, Default)]
pub struct Calculator;

impl Controller for Calculator {
    fn create() -> Result<Self, BoxError> {
        Ok(Calculator)
    }
}

impl Calculator {
    pub fn soma(&self, a: i64, b: i64) -> Result<i64, InvokeError> {
        tracing::debug!(a, b, "Executing soma");
        a.checked_add(b)
            .ok_or_else(|| InvokeError::failed(format!("{a} + {b} overflows")))
    }

    pub fn echo(&self, mensagem: &str) -> String {
        format!("Você disse: {mensagem}")
    }

    pub(crate) fn invoke_soma(&self, args: &Arguments) -> Result<i64, InvokeError> {
        self.soma(args.integer(0)?, args.integer(1)?)
    }

    pub(crate) fn invoke_echo(&self, args: &Arguments) -> Result<String, InvokeError> {
        Ok(self.echo(args.text(0)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soma_adds() {
        assert_eq!(Calculator.soma(5, 10).unwrap(), 15);
        assert_eq!(Calculator.soma(-3, 3).unwrap(), 0);
    }

    #[test]
    fn soma_reports_overflow() {
        assert!(matches!(
            Calculator.soma(i64::MAX, 1),
            Err(InvokeError::Failed(_))
        ));
    }

    #[test]
    fn echo_prefixes_message() {
        assert_eq!(Calculator.echo("oi"), "Você disse: oi");
    }
}
