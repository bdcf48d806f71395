use figma_scene_common::protocol::error::{BridgeError, Result};
use figma_scene_sandbox::ScriptLimits;

use crate::scripts;

/// Which callables a sandbox is willing to execute.
///
/// Any string arriving in a `figma-scene-run` or `figma-scene-on` envelope is
/// source code that runs with access to the host document API.
/// `Unrestricted` keeps that generality. `CatalogOnly` narrows it to the
/// built-in callables behind the convenience methods and host function
/// pass-throughs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptPolicy {
    #[default]
    Unrestricted,
    CatalogOnly,
}

impl ScriptPolicy {
    /// Checks `source` against the policy.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::ScriptRejected` when the policy forbids it.
    pub fn check(&self, source: &str) -> Result<()> {
        match self {
            ScriptPolicy::Unrestricted => Ok(()),
            ScriptPolicy::CatalogOnly if scripts::is_builtin(source) => Ok(()),
            ScriptPolicy::CatalogOnly => Err(BridgeError::ScriptRejected(
                "only built-in callables are accepted".to_string(),
            )),
        }
    }
}

/// Bridge configuration.
///
/// # Default Configuration
///
/// - `policy`: [`ScriptPolicy::Unrestricted`]
/// - `limits`: [`ScriptLimits::default`]
///
/// Both only affect a sandbox-side bridge; a UI bridge never executes
/// callables.
///
/// # Example
///
/// ```
/// use figma_scene::{BridgeConfig, ScriptPolicy};
/// use figma_scene_sandbox::ScriptLimits;
/// use std::time::Duration;
///
/// let config = BridgeConfig::new()
///     .with_policy(ScriptPolicy::CatalogOnly)
///     .with_limits(ScriptLimits::new().with_execution_timeout(Duration::from_secs(5)));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeConfig {
    pub policy: ScriptPolicy,
    pub limits: ScriptLimits,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: ScriptPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_limits(mut self, limits: ScriptLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.limits.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_policy_accepts_anything() {
        assert!(ScriptPolicy::default().check("(x) => x + 1").is_ok());
    }

    #[test]
    fn test_catalog_only_rejects_arbitrary_source() {
        let policy = ScriptPolicy::CatalogOnly;
        assert!(policy.check(scripts::NOTIFY).is_ok());
        assert!(policy.check(scripts::PASS_THROUGH).is_ok());
        assert!(matches!(
            policy.check("() => figma.root.remove()"),
            Err(BridgeError::ScriptRejected(_))
        ));
    }

    #[test]
    fn test_validate_delegates_to_limits() {
        let config = BridgeConfig::new()
            .with_limits(ScriptLimits::new().with_execution_timeout(Duration::ZERO));
        assert!(config.validate().is_err());
        assert!(BridgeConfig::default().validate().is_ok());
    }
}
