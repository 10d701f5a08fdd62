//! Subcommand implementations

pub mod clusters;
pub mod configure;
pub mod contexts;
pub mod costs;
pub mod inventory;
pub mod resources;
pub mod scaling;
