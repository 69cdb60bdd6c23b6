//! AWS resource schema definitions

pub mod ecs;
pub mod route53;
pub mod types;

use lyra_core::schema::ResourceSchema;

/// Returns all AWS schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    let mut schemas = Vec::new();
    schemas.extend(route53::schemas());
    schemas.extend(ecs::schemas());
    schemas
}
