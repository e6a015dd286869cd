//! Deterministic simulation harness for relaywatch.
//!
//! Virtual-time implementations of the Environment, Transport and Driver
//! traits, so the production runtime can be exercised reproducibly under
//! arbitrary event orderings.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the common
//! notification and indicator invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod scenario;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_transport;

pub use invariants::{
    DisruptionVisible, IndicatorSnapshot, Invariant, InvariantRegistry, InvariantResult,
    NotificationSnapshot, QueueSnapshot, ReconnectGated, SystemSnapshot, TimersAccountedFor,
    UniqueDedupeKeys, UniqueIds, Violation,
};
pub use scenario::Scenario;
pub use sim_driver::{Frame, SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_transport::MockTransport;
