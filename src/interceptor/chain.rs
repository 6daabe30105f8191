//! Ordered before/after interceptor lists.

use std::fmt;

use crate::interceptor::{InterceptorError, InterceptorRef};

/// Which side of the invocation a hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    After,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Before => f.write_str("before"),
            Phase::After => f.write_str("after"),
        }
    }
}

/// An interceptor failed; the rest of its phase was skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("interceptor {interceptor} failed ({phase}): {source}")]
pub struct HookError {
    pub phase: Phase,
    pub interceptor: String,
    #[source]
    pub source: InterceptorError,
}

/// Hooks attached to one operation.
#[derive(Debug, Clone, Default)]
pub struct InterceptorChain {
    before: Vec<InterceptorRef>,
    after: Vec<InterceptorRef>,
}

impl InterceptorChain {
    pub fn new(before: Vec<InterceptorRef>, after: Vec<InterceptorRef>) -> Self {
        Self { before, after }
    }

    pub fn push_before(&mut self, interceptor: InterceptorRef) {
        self.before.push(interceptor);
    }

    pub fn push_after(&mut self, interceptor: InterceptorRef) {
        self.after.push(interceptor);
    }

    pub fn run_before(&self) -> Result<(), HookError> {
        run_phase(&self.before, Phase::Before)
    }

    pub fn run_after(&self) -> Result<(), HookError> {
        run_phase(&self.after, Phase::After)
    }
}

fn run_phase(hooks: &[InterceptorRef], phase: Phase) -> Result<(), HookError> {
    for hook in hooks {
        let interceptor = hook.instantiate();
        let outcome = match phase {
            Phase::Before => interceptor.before(),
            Phase::After => interceptor.after(),
        };
        outcome.map_err(|source| {
            tracing::warn!(interceptor = hook.name(), %phase, error = %source, "Interceptor failed");
            HookError {
                phase,
                interceptor: hook.name().to_string(),
                source,
            }
        })?;
    }
    Ok(())
}
