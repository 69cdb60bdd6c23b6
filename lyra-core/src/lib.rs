//! Lyra Core
//!
//! Resource model, attribute schemas and the provider trait shared by
//! Lyra resource handlers

pub mod decode;
pub mod provider;
pub mod resource;
pub mod schema;
