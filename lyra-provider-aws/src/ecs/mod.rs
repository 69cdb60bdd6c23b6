//! ECS capacity providers

pub mod capacity_provider;
pub mod expand;
pub mod model;
pub mod operations;

pub use operations::EcsOperations;
