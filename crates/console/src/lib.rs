//! Fleet console HTTP service
//!
//! Exposes the fleet-core operations over JSON, plus health, readiness and
//! Prometheus metrics endpoints.

pub mod api;
pub mod config;
