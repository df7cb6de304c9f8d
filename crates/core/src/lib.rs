//! Tiered process initialization for the debugger toolchain.
//!
//! Startup and shutdown are split into tiers so that lightweight consumers
//! (debug servers) only link the [`Tier::Common`] tier while full debug
//! clients also bring up the client-only tier (feature `full`).
//!
//! ```text
//! LifetimeManager ── owns ──> SystemContext (file system, logs, host, plugins)
//!       │
//!       └── initialize ──> Common ──> Full
//!           terminate  <── Common <── Full
//! ```

pub mod common;
pub mod context;
pub mod error;
pub mod facility;
#[cfg(feature = "full")]
pub mod full;
pub mod lifecycle;
pub mod manager;
pub mod types;

pub use common::{CommonInitializer, CommonOptions};
pub use context::{ContextSnapshot, SystemContext};
pub use error::{FacilityError, InitializationError};
#[cfg(feature = "full")]
pub use full::FullInitializer;
pub use lifecycle::{Initializer, SystemInitializer};
pub use manager::{LifetimeManager, StartupReport};
pub use types::{ConsumerProfile, FailurePolicy, LifecycleState, ParseEnumError, Tier};
