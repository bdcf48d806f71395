//! Resource limits for callable execution.
//!
//! Callables arriving from the UI are arbitrary source text, so the sandbox
//! bounds how long and how deep each one may run.

use std::time::Duration;

/// Default bound on the iterations of a single loop.
pub const DEFAULT_LOOP_ITERATION_LIMIT: u64 = 10_000_000;

/// Resource limits for executing a marshaled callable.
///
/// # Fields
///
/// - `execution_timeout` - Maximum wall time before the call is reported as
///   timed out (default: 30 seconds)
/// - `loop_iteration_limit` - Maximum iterations of any single loop
///   (default: [`DEFAULT_LOOP_ITERATION_LIMIT`])
/// - `recursion_limit` - Maximum call depth (default: 512)
///
/// The timeout stops waiting for a result but cannot interrupt the engine.
/// A timed-out callable keeps its blocking thread until a loop or recursion
/// limit stops it, so raising the loop limit to `u64::MAX` lets a runaway
/// loop hold that thread forever.
///
/// # Example
///
/// ```
/// use figma_scene_sandbox::ScriptLimits;
/// use std::time::Duration;
///
/// let limits = ScriptLimits::new()
///     .with_execution_timeout(Duration::from_secs(5))
///     .with_loop_iteration_limit(1_000_000);
/// assert!(limits.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLimits {
    /// Maximum time allowed for a callable to settle
    pub execution_timeout: Duration,
    /// Maximum iterations of a single loop
    pub loop_iteration_limit: u64,
    /// Maximum call stack depth
    pub recursion_limit: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            execution_timeout: Duration::from_secs(30),
            loop_iteration_limit: DEFAULT_LOOP_ITERATION_LIMIT,
            recursion_limit: 512,
        }
    }
}

impl ScriptLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    pub fn with_loop_iteration_limit(mut self, limit: u64) -> Self {
        self.loop_iteration_limit = limit;
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Validates the limits.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Execution timeout is zero
    /// - Execution timeout is longer than one hour
    /// - Loop iteration or recursion limit is zero
    pub fn validate(&self) -> Result<(), String> {
        if self.execution_timeout.is_zero() {
            return Err("execution timeout must be greater than zero".to_string());
        }

        if self.execution_timeout.as_secs() > 3600 {
            return Err(format!(
                "execution timeout must be <= 1 hour (got {} seconds)",
                self.execution_timeout.as_secs()
            ));
        }

        if self.loop_iteration_limit == 0 {
            return Err("loop iteration limit must be greater than zero".to_string());
        }

        if self.recursion_limit == 0 {
            return Err("recursion limit must be greater than zero".to_string());
        }

        Ok(())
    }
}
