//! Common types for hosted control plane components
//!
//! The HostedControlPlane descriptor, owner references, the deployment
//! policy applier, the availability prober, and shared defaults. Nothing in
//! this crate talks to a cluster.

#![deny(missing_docs)]

pub mod config;
pub mod crd;
pub mod deployment_config;
pub mod error;
pub mod ownership;
pub mod prober;
pub mod telemetry;

pub use crd::{AutoscalingOptions, HostedControlPlane, HostedControlPlaneSpec};
pub use deployment_config::{DeploymentConfig, Scheduling};
pub use error::Error;
pub use ownership::OwnerRef;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
