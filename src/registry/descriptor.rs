//! Operation descriptors and the declarative builder that produces them.
//!
//! # Responsibilities
//! - Describe one invocable operation: handler type, callable, bindings, hooks
//! - Validate registration input before anything reaches the registry
//!
//! # Design Decisions
//! - Handler types are identified by `TypeId`; the callable downcasts the
//!   shared instance back to the concrete type
//! - Descriptors are immutable once built and shared via `Arc`

use std::any::{type_name, Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::{Arguments, InvokeError, Value};
use crate::interceptor::{Interceptor, InterceptorChain, InterceptorRef};
use crate::lifecycle::handlers::{ConstructError, Controller, SharedHandler};
use crate::model::Method;
use crate::registry::{ParamKind, ParameterBinding, RoutingKey};

/// Type-erased operation body.
pub type Callable =
    Arc<dyn Fn(&(dyn Any + Send + Sync), &Arguments) -> Result<Value, InvokeError> + Send + Sync>;

/// Identity and factory of a handler type.
#[derive(Clone, Copy)]
pub struct HandlerType {
    id: TypeId,
    name: &'static str,
    factory: fn() -> Result<SharedHandler, ConstructError>,
}

impl HandlerType {
    pub fn of<H: Controller>() -> Self {
        Self {
            id: TypeId::of::<H>(),
            name: type_name::<H>(),
            factory: construct::<H>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build a fresh instance. Callers go through the handler cache instead.
    pub fn construct(&self) -> Result<SharedHandler, ConstructError> {
        (self.factory)()
    }
}

impl fmt::Debug for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerType").field("name", &self.name).finish()
    }
}

fn construct<H: Controller>() -> Result<SharedHandler, ConstructError> {
    let handler = H::create().map_err(|source| ConstructError {
        handler: type_name::<H>().to_string(),
        reason: source.to_string(),
    })?;
    Ok(Arc::new(handler))
}

/// Errors raised while building an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("unsupported parameter kind {kind:?}")]
    UnsupportedKind {
        parameter: Option<String>,
        kind: String,
    },

    #[error("invalid route path {path:?}: must start with '/' and contain no whitespace or '?'")]
    InvalidPath { path: String },

    #[error("parameter '{name}' bound twice on {key}")]
    DuplicateParameter { key: String, name: String },

    #[error("no callable registered for {key}")]
    MissingCallable { key: String },
}

/// Everything the dispatcher needs to bind and invoke one operation.
pub struct OperationDescriptor {
    key: RoutingKey,
    handler: HandlerType,
    callable: Callable,
    bindings: Vec<ParameterBinding>,
    interceptors: InterceptorChain,
}

impl OperationDescriptor {
    pub fn key(&self) -> &RoutingKey {
        &self.key
    }

    pub fn handler(&self) -> &HandlerType {
        &self.handler
    }

    pub fn bindings(&self) -> &[ParameterBinding] {
        &self.bindings
    }

    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    /// Call the operation on an already-resolved handler instance.
    pub fn invoke(
        &self,
        instance: &(dyn Any + Send + Sync),
        arguments: &Arguments,
    ) -> Result<Value, InvokeError> {
        (self.callable)(instance, arguments)
    }
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("key", &self.key)
            .field("handler", &self.handler)
            .field("bindings", &self.bindings)
            .field("interceptors", &self.interceptors)
            .finish()
    }
}

/// Declarative builder for an [`OperationDescriptor`].
///
/// ```
/// use rpc_middleware::app::{Calculator, LogInterceptor};
/// use rpc_middleware::dispatch::Arguments;
/// use rpc_middleware::{Dispatcher, Method, Operation, ParamKind, Request};
///
/// let soma = Operation::route(Method::Get, "/soma")
///     .param("a", ParamKind::Integer)
///     .param("b", ParamKind::Integer)
///     .before::<LogInterceptor>()
///     .invoke(|calc: &Calculator, args: &Arguments| calc.soma(args.integer(0)?, args.integer(1)?))
///     .build()?;
///
/// let dispatcher = Dispatcher::new();
/// dispatcher.register(soma);
///
/// let request = Request::new(Method::Get, "/soma")
///     .with_param("a", "2")
///     .with_param("b", "3");
/// assert_eq!(dispatcher.dispatch(&request).unwrap().body, "5");
/// # Ok::<(), rpc_middleware::registry::RegistrationError>(())
/// ```
pub struct Operation {
    method: Method,
    path: String,
    handler: Option<HandlerType>,
    callable: Option<Callable>,
    bindings: Vec<ParameterBinding>,
    interceptors: InterceptorChain,
    errors: Vec<RegistrationError>,
}

impl Operation {
    pub fn route(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            handler: None,
            callable: None,
            bindings: Vec::new(),
            interceptors: InterceptorChain::default(),
            errors: Vec::new(),
        }
    }

    /// Append the next positional parameter.
    pub fn param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.bindings.push(ParameterBinding::new(name, kind));
        self
    }

    /// Like [`Operation::param`] with the kind given as text (`"int"`,
    /// `"string"`). Unknown kinds make [`Operation::build`] fail.
    pub fn param_str(mut self, name: impl Into<String>, kind: &str) -> Self {
        let name = name.into();
        match kind.parse::<ParamKind>() {
            Ok(kind) => self.bindings.push(ParameterBinding::new(name, kind)),
            Err(_) => self.errors.push(RegistrationError::UnsupportedKind {
                parameter: Some(name),
                kind: kind.to_string(),
            }),
        }
        self
    }

    pub fn before<I: Interceptor + Default + 'static>(self) -> Self {
        self.before_ref(InterceptorRef::of::<I>())
    }

    pub fn before_ref(mut self, interceptor: InterceptorRef) -> Self {
        self.interceptors.push_before(interceptor);
        self
    }

    pub fn after<I: Interceptor + Default + 'static>(self) -> Self {
        self.after_ref(InterceptorRef::of::<I>())
    }

    pub fn after_ref(mut self, interceptor: InterceptorRef) -> Self {
        self.interceptors.push_after(interceptor);
        self
    }

    /// Set the operation body. The handler type is taken from the closure's
    /// first argument.
    pub fn invoke<H, F, R>(mut self, body: F) -> Self
    where
        H: Controller,
        F: Fn(&H, &Arguments) -> Result<R, InvokeError> + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.handler = Some(HandlerType::of::<H>());
        self.callable = Some(Arc::new(
            move |instance: &(dyn Any + Send + Sync),
                  arguments: &Arguments|
                  -> Result<Value, InvokeError> {
                let handler = instance
                    .downcast_ref::<H>()
                    .ok_or(InvokeError::HandlerMismatch {
                        expected: type_name::<H>(),
                    })?;
                body(handler, arguments).map(Into::into)
            },
        ));
        self
    }

    pub fn build(self) -> Result<OperationDescriptor, RegistrationError> {
        let key = RoutingKey::new(self.method, &self.path);

        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        if !self.path.starts_with('/')
            || self.path.contains('?')
            || self.path.chars().any(char::is_whitespace)
        {
            return Err(RegistrationError::InvalidPath { path: self.path });
        }

        let mut seen = HashSet::new();
        for binding in &self.bindings {
            if !seen.insert(binding.name.as_str()) {
                return Err(RegistrationError::DuplicateParameter {
                    key: key.to_string(),
                    name: binding.name.clone(),
                });
            }
        }

        let (handler, callable) = match (self.handler, self.callable) {
            (Some(handler), Some(callable)) => (handler, callable),
            _ => {
                return Err(RegistrationError::MissingCallable {
                    key: key.to_string(),
                })
            }
        };

        Ok(OperationDescriptor {
            key,
            handler,
            callable,
            bindings: self.bindings,
            interceptors: self.interceptors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::handlers::BoxError;

    #[derive(Debug)]
    struct Greeter;

    impl Controller for Greeter {
        fn create() -> Result<Self, BoxError> {
            Ok(Greeter)
        }
    }

    fn greet() -> Operation {
        Operation::route(Method::Get, "/greet")
            .param("name", ParamKind::String)
            .invoke(|_: &Greeter, args: &Arguments| Ok(format!("hi {}", args.text(0)?)))
    }

    #[test]
    fn builds_descriptor_with_ordered_bindings() {
        let op = Operation::route(Method::Get, "/pair")
            .param("b", ParamKind::Integer)
            .param_str("a", "string")
            .invoke(|_: &Greeter, _: &Arguments| Ok(()))
            .build()
            .unwrap();

        assert_eq!(op.key().as_str(), "GET:/pair");
        let names: Vec<_> = op.bindings().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(op.bindings()[1].kind, ParamKind::String);
    }

    #[test]
    fn invokes_through_erased_instance() {
        let op = greet().build().unwrap();
        let instance = op.handler().construct().unwrap();
        let args = Arguments::new(vec![Value::Text("ana".into())]);
        assert_eq!(op.invoke(&*instance, &args).unwrap(), Value::Text("hi ana".into()));
    }

    #[test]
    fn wrong_instance_type_is_reported() {
        let op = greet().build().unwrap();
        let other: SharedHandler = Arc::new(42_u8);
        let err = op.invoke(&*other, &Arguments::default()).unwrap_err();
        assert!(matches!(err, InvokeError::HandlerMismatch { .. }));
    }

    #[test]
    fn unsupported_kind_fails_at_build() {
        let err = greet().param_str("ratio", "float").build().unwrap_err();
        assert_eq!(
            err,
            RegistrationError::UnsupportedKind {
                parameter: Some("ratio".into()),
                kind: "float".into(),
            }
        );
    }

    #[test]
    fn rejects_bad_paths_duplicates_and_missing_callable() {
        let err = Operation::route(Method::Get, "soma")
            .invoke(|_: &Greeter, _: &Arguments| Ok(()))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidPath { .. }));

        let err = greet().param("name", ParamKind::String).build().unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateParameter { ref name, .. } if name == "name"));

        let err = Operation::route(Method::Get, "/none").build().unwrap_err();
        assert_eq!(err, RegistrationError::MissingCallable { key: "GET:/none".into() });
    }
}
