use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Initialization tiers known at build time, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Process-wide state shared by every consumer profile.
    Common,
    /// Client-only functionality layered on top of [`Tier::Common`].
    #[cfg(feature = "full")]
    Full,
}

impl Tier {
    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            #[cfg(feature = "full")]
            Self::Full => "full",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-instance lifecycle of an initializer.
///
/// ```text
/// Constructed --initialize ok--> Initialized --terminate--> Terminated
///      |                                                        ^
///      +--initialize err--> Failed ---------terminate-----------+
///      +-------------------------terminate (no-op)--------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Constructed,
    Initialized,
    Failed,
    Terminated,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constructed => "constructed",
            Self::Initialized => "initialized",
            Self::Failed => "failed",
            Self::Terminated => "terminated",
        }
    }

    /// Returns `true` when `terminate` still has effects to revert.
    pub fn is_terminable(self) -> bool {
        matches!(self, Self::Initialized | Self::Failed)
    }
}

/// Link/build configuration that decides which tiers a consumer brings up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerProfile {
    /// Size-constrained debug servers: Common tier only.
    Server,
    /// Full debug clients: every tier.
    #[cfg(feature = "full")]
    Client,
}

impl ConsumerProfile {
    /// Tiers linked into this profile, in initialization order.
    pub fn tiers(self) -> &'static [Tier] {
        match self {
            Self::Server => &[Tier::Common],
            #[cfg(feature = "full")]
            Self::Client => &[Tier::Common, Tier::Full],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            #[cfg(feature = "full")]
            Self::Client => "client",
        }
    }
}

impl Default for ConsumerProfile {
    #[cfg(feature = "full")]
    fn default() -> Self {
        Self::Client
    }

    #[cfg(not(feature = "full"))]
    fn default() -> Self {
        Self::Server
    }
}

impl FromStr for ConsumerProfile {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "server" | "minimal" => Ok(Self::Server),
            #[cfg(feature = "full")]
            "client" | "full" => Ok(Self::Client),
            other => Err(ParseEnumError {
                kind: "consumer profile",
                value: other.to_string(),
            }),
        }
    }
}

/// What the lifetime manager does when one tier fails to initialize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing tier and report the error.
    #[default]
    Abort,
    /// Keep initializing the remaining tiers and run degraded.
    Continue,
}

impl FailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Continue => "continue",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "abort" => Ok(Self::Abort),
            "continue" | "degraded" => Ok(Self::Continue),
            other => Err(ParseEnumError {
                kind: "failure policy",
                value: other.to_string(),
            }),
        }
    }
}

/// Error returned when parsing one of the string-backed enums fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_profile_links_common_only() {
        assert_eq!(ConsumerProfile::Server.tiers(), &[Tier::Common]);
    }

    #[cfg(feature = "full")]
    #[test]
    fn client_profile_orders_common_before_full() {
        assert_eq!(ConsumerProfile::Client.tiers(), &[Tier::Common, Tier::Full]);
        assert_eq!(ConsumerProfile::default(), ConsumerProfile::Client);
    }

    #[test]
    fn parses_failure_policy_aliases() {
        assert_eq!("abort".parse::<FailurePolicy>(), Ok(FailurePolicy::Abort));
        assert_eq!(
            "degraded".parse::<FailurePolicy>(),
            Ok(FailurePolicy::Continue)
        );
        let err = "sometimes".parse::<FailurePolicy>().unwrap_err();
        assert_eq!(err.to_string(), "unknown failure policy: sometimes");
    }

    #[test]
    fn only_initialized_and_failed_states_are_terminable() {
        assert!(!LifecycleState::Constructed.is_terminable());
        assert!(LifecycleState::Initialized.is_terminable());
        assert!(LifecycleState::Failed.is_terminable());
        assert!(!LifecycleState::Terminated.is_terminable());
    }
}
