//! Watch-driven runner for the trust chain reconcilers
//!
//! Schedules passes on watch events and a resync interval, applies the
//! requeue policy, and records rotation milestones as Kubernetes Events.

#![deny(missing_docs)]

pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod migrate;
pub mod status;
pub mod watch;

pub use config::{DriverConfig, OperatorArgs};
pub use driver::Driver;
pub use error::Error;
