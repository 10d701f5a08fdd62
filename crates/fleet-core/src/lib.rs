//! Fleet console core library
//!
//! This crate provides the core functionality for:
//! - Normalizing cluster resource listings into uniform descriptors
//! - Namespace and fleet-wide aggregation
//! - Node group scaling, add-on and version inspection
//! - Cost estimation with an even-split fallback
//! - Per-service cost ranking and tagged resource inventory
//! - Health checks and observability

pub mod aggregation;
pub mod cost;
pub mod error;
pub mod fleet;
pub mod health;
pub mod inventory;
pub mod models;
pub mod normalizer;
pub mod observability;
pub mod scaling;
pub mod upstream;
pub mod version;

#[cfg(test)]
mod fakes;

pub use error::{FleetError, FleetResult};
pub use fleet::{ConnectResult, ContextSwitch, FleetService};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use inventory::ResourceCount;
pub use normalizer::{ResourceDescriptor, ResourceDetail, ResourceKind};
pub use observability::{FleetMetrics, StructuredLogger};
