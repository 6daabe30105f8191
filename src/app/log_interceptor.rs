use crate::interceptor::{Interceptor, InterceptorError};

/// Logs around every call it is attached to.
#[derive(Debug, Default)]
pub struct LogInterceptor;

impl Interceptor for LogInterceptor {
    fn before(&self) -> Result<(), InterceptorError> {
        tracing::info!(">>> before operation");
        Ok(())
    }

    fn after(&self) -> Result<(), InterceptorError> {
        tracing::info!("<<< after operation");
        Ok(())
    }
}
