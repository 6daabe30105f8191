//! The lookup → hooks → bind → invoke → hooks → render pipeline.

use std::sync::Arc;
use std::time::Instant;

use crate::dispatch::{bind_arguments, Dispatch, DispatchError, Value};
use crate::lifecycle::handlers::HandlerCache;
use crate::model::{Request, Response};
use crate::observability::metrics;
use crate::registry::{OperationDescriptor, RouteRegistry};

/// Owns the route registry and handler cache for one middleware instance.
///
/// Build one per process (or per test) and share it through `Arc`.
#[derive(Debug, Default)]
pub struct Dispatcher {
    registry: RouteRegistry,
    handlers: HandlerCache,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one operation; returns the descriptor it replaced, if any.
    pub fn register(&self, operation: OperationDescriptor) -> Option<Arc<OperationDescriptor>> {
        self.registry.register(operation)
    }

    pub fn register_all(&self, operations: impl IntoIterator<Item = OperationDescriptor>) {
        for operation in operations {
            self.register(operation);
        }
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn handlers(&self) -> &HandlerCache {
        &self.handlers
    }

    /// Handle one request.
    ///
    /// Returns `Err` only for an after-interceptor failure; every other
    /// outcome is a [`Response`].
    pub fn dispatch(&self, request: &Request) -> Result<Response, DispatchError> {
        let start = Instant::now();
        let key = request.routing_key();

        tracing::debug!(route = %key, params = request.params.len(), "Dispatching request");

        match self.execute(request) {
            Ok(value) => {
                metrics::record_dispatch(key.as_str(), 200, start);
                Ok(Response::ok(value.to_string()))
            }
            Err(err) if err.is_fatal() => {
                tracing::error!(route = %key, error = %err, "After interceptor failed");
                metrics::record_dispatch(key.as_str(), err.status_code(), start);
                Err(err)
            }
            Err(err) => {
                let status = err.status_code();
                let route = match &err {
                    DispatchError::RouteNotFound { .. } => "unmatched",
                    _ => key.as_str(),
                };
                if status >= 500 {
                    tracing::warn!(route = %key, kind = err.kind(), error = %err, "Dispatch failed");
                } else {
                    tracing::debug!(route = %key, kind = err.kind(), error = %err, "Request rejected");
                }
                metrics::record_dispatch(route, status, start);
                Ok(Response::new(status, err.to_string()))
            }
        }
    }

    fn execute(&self, request: &Request) -> Result<Value, DispatchError> {
        let key = request.routing_key();
        let operation = self
            .registry
            .lookup(&key)
            .ok_or_else(|| DispatchError::RouteNotFound {
                key: key.to_string(),
            })?;

        operation
            .interceptors()
            .run_before()
            .map_err(DispatchError::BeforeHook)?;

        let arguments = bind_arguments(operation.bindings(), &request.params)?;

        let instance = self
            .handlers
            .instance(operation.handler())
            .map_err(|e| DispatchError::MalformedRequest {
                message: e.to_string(),
            })?;

        let value = operation.invoke(&*instance, &arguments)?;

        operation
            .interceptors()
            .run_after()
            .map_err(DispatchError::AfterHook)?;

        Ok(value)
    }
}

impl Dispatch for Dispatcher {
    fn dispatch(&self, request: &Request) -> Result<Response, DispatchError> {
        Dispatcher::dispatch(self, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Arguments, InvokeError};
    use crate::interceptor::{Interceptor, InterceptorError, InterceptorRef};
    use crate::lifecycle::handlers::{BoxError, Controller};
    use crate::model::Method;
    use crate::registry::{Operation, ParamKind};
    use std::sync::Mutex;

    struct Adder;

    impl Controller for Adder {
        fn create() -> Result<Self, BoxError> {
            Ok(Adder)
        }
    }

    struct Unbuildable;

    impl Controller for Unbuildable {
        fn create() -> Result<Self, BoxError> {
            Err("no default constructor".into())
        }
    }

    type Log = Arc<Mutex<Vec<&'static str>>>;

    struct Recorder {
        log: Log,
        fail_after: bool,
    }

    impl Interceptor for Recorder {
        fn before(&self) -> Result<(), InterceptorError> {
            self.log.lock().unwrap().push("before");
            Ok(())
        }

        fn after(&self) -> Result<(), InterceptorError> {
            self.log.lock().unwrap().push("after");
            if self.fail_after {
                return Err(InterceptorError::new("audit sink offline"));
            }
            Ok(())
        }
    }

    fn recorder(log: &Log, fail_after: bool) -> InterceptorRef {
        let log = Arc::clone(log);
        InterceptorRef::from_fn("recorder", move || {
            Box::new(Recorder {
                log: Arc::clone(&log),
                fail_after,
            })
        })
    }

    fn sum_op(log: &Log, fail_after: bool) -> OperationDescriptor {
        let invoked = Arc::clone(log);
        Operation::route(Method::Get, "/soma")
            .param("a", ParamKind::Integer)
            .param("b", ParamKind::Integer)
            .before_ref(recorder(log, fail_after))
            .after_ref(recorder(log, fail_after))
            .invoke(move |_: &Adder, args: &Arguments| {
                invoked.lock().unwrap().push("invoke");
                Ok(args.integer(0)? + args.integer(1)?)
            })
            .build()
            .unwrap()
    }

    fn get(path: &str) -> Request {
        Request::new(Method::Get, path)
    }

    #[test]
    fn sums_bound_integers() {
        let log = Log::default();
        let dispatcher = Dispatcher::new();
        dispatcher.register(sum_op(&log, false));

        let response = dispatcher
            .dispatch(&get("/soma").with_param("a", "5").with_param("b", "10"))
            .unwrap();
        assert_eq!(response, Response::new(200, "15"));
        assert_eq!(*log.lock().unwrap(), ["before", "invoke", "after"]);
    }

    #[test]
    fn missing_parameter_is_400_and_skips_invocation() {
        let log = Log::default();
        let dispatcher = Dispatcher::new();
        dispatcher.register(sum_op(&log, false));

        let response = dispatcher.dispatch(&get("/soma").with_param("a", "5")).unwrap();
        assert_eq!(response.status_code, 400);
        assert!(response.body.contains('b'));
        assert_eq!(*log.lock().unwrap(), ["before"]);
    }

    #[test]
    fn unknown_route_is_404_with_key() {
        let dispatcher = Dispatcher::new();
        let response = dispatcher.dispatch(&get("/nope")).unwrap();
        assert_eq!(response.status_code, 404);
        assert!(response.body.contains("GET:/nope"));
    }

    #[test]
    fn non_numeric_integer_is_500() {
        let log = Log::default();
        let dispatcher = Dispatcher::new();
        dispatcher.register(sum_op(&log, false));

        let response = dispatcher
            .dispatch(&get("/soma").with_param("a", "five").with_param("b", "1"))
            .unwrap();
        assert_eq!(response.status_code, 500);
        assert!(!log.lock().unwrap().contains(&"after"));
    }

    #[test]
    fn handler_failure_is_500_and_skips_after_hooks() {
        let log = Log::default();
        let dispatcher = Dispatcher::new();
        dispatcher.register(
            Operation::route(Method::Post, "/fail")
                .after_ref(recorder(&log, false))
                .invoke(|_: &Adder, _: &Arguments| Err::<(), _>(InvokeError::failed("division by zero")))
                .build()
                .unwrap(),
        );

        let response = dispatcher.dispatch(&Request::new(Method::Post, "/fail")).unwrap();
        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("division by zero"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn after_hook_failure_escapes_dispatch() {
        let log = Log::default();
        let dispatcher = Dispatcher::new();
        dispatcher.register(sum_op(&log, true));

        let err = dispatcher
            .dispatch(&get("/soma").with_param("a", "1").with_param("b", "2"))
            .unwrap_err();
        assert!(matches!(err, DispatchError::AfterHook(_)));
        assert_eq!(*log.lock().unwrap(), ["before", "invoke", "after"]);
    }

    #[test]
    fn construction_failure_is_400() {
        let dispatcher = Dispatcher::new();
        dispatcher.register(
            Operation::route(Method::Get, "/broken")
                .invoke(|_: &Unbuildable, _: &Arguments| Ok(()))
                .build()
                .unwrap(),
        );

        let response = dispatcher.dispatch(&get("/broken")).unwrap();
        assert_eq!(response.status_code, 400);
        assert!(response.body.contains("no default constructor"));
    }

    #[test]
    fn unit_result_renders_empty_body() {
        let dispatcher = Dispatcher::new();
        dispatcher.register(
            Operation::route(Method::Delete, "/reset")
                .invoke(|_: &Adder, _: &Arguments| Ok(()))
                .build()
                .unwrap(),
        );

        let response = dispatcher.dispatch(&Request::new(Method::Delete, "/reset")).unwrap();
        assert_eq!(response, Response::new(200, ""));
    }
}
