//! ecs_capacity_provider handlers
//!
//! The capacity provider ARN is the stored identifier. ECS has no delete call
//! for capacity providers, so delete only detaches the resource from state.

use std::collections::HashMap;

use log::{debug, info, warn};
use lyra_core::decode::AttributeReader;
use lyra_core::provider::{DeleteOutcome, ProviderError, ProviderResult};
use lyra_core::resource::{Resource, ResourceId, State, Value};
use lyra_core::schema::TypeError;

use super::expand::{expand, flatten};
use super::model::CreateCapacityProviderRequest;
use super::operations::EcsOperations;
use crate::context::CallerContext;
use crate::tags;

pub const RESOURCE_TYPE: &str = "ecs_capacity_provider";

fn invalid(id: &ResourceId) -> impl Fn(TypeError) -> ProviderError + '_ {
    move |e| ProviderError::validation(e.to_string()).for_resource(id.clone())
}

/// Create the capacity provider, then read it back by ARN
pub async fn create(ops: &dyn EcsOperations, resource: &Resource) -> ProviderResult<State> {
    let attrs = AttributeReader::new(&resource.attributes);
    let name = attrs.required_string("name").map_err(invalid(&resource.id))?;
    let auto_scaling_group_provider = expand(&resource.attributes).map_err(invalid(&resource.id))?;
    let tags = tags::ignore_aws(attrs.string_map("tags").map_err(invalid(&resource.id))?);

    let request = CreateCapacityProviderRequest {
        name: name.to_string(),
        auto_scaling_group_provider,
        tags,
    };
    debug!("Creating ECS Capacity Provider: {:?}", request);

    let created = ops.create_provider(request).await.map_err(|e| {
        e.into_provider_error(format!("Error creating ECS Capacity Provider ({})", name))
            .for_resource(resource.id.clone())
    })?;
    info!("ECS Capacity Provider created: {}", created.arn);

    let state = read(ops, &resource.id, &created.arn)
        .await
        .map_err(|e| e.with_identifier(created.arn.clone()))?;
    if !state.exists {
        return Err(ProviderError::api(format!(
            "ECS Capacity Provider ({}) not found after creation",
            created.arn
        ))
        .for_resource(resource.id.clone())
        .with_identifier(created.arn));
    }
    Ok(state)
}

/// Describe the capacity provider with ARN `identifier`
pub async fn read(
    ops: &dyn EcsOperations,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let providers = ops
        .describe_providers(vec![identifier.to_string()])
        .await
        .map_err(|e| {
            e.into_provider_error(format!("Error reading ECS Capacity Provider ({})", identifier))
                .for_resource(id.clone())
        })?;

    let Some(provider) = providers.into_iter().find(|cp| cp.arn == identifier) else {
        warn!(
            "ECS Capacity Provider ({}) not found, removing from state",
            identifier
        );
        return Ok(State::not_found(id.clone()));
    };

    let mut attributes = HashMap::new();
    attributes.insert("arn".to_string(), Value::string(&provider.arn));
    attributes.insert("name".to_string(), Value::string(provider.name));
    attributes.insert(
        "tags".to_string(),
        tags::to_value(&tags::ignore_aws(provider.tags)),
    );
    if let Some(asg) = &provider.auto_scaling_group_provider {
        attributes.insert("auto_scaling_group_provider".to_string(), flatten(asg));
    }

    Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
}

/// Apply tag changes; every other attribute forces replacement
pub async fn update(
    ops: &dyn EcsOperations,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    let old = AttributeReader::new(&from.attributes)
        .string_map("tags")
        .map_err(invalid(id))?;
    let new = AttributeReader::new(&to.attributes)
        .string_map("tags")
        .map_err(invalid(id))?;

    let changes = tags::diff(&old, &new);
    let context = || format!("Error updating ECS Capacity Provider ({}) tags", identifier);

    if !changes.removed.is_empty() {
        debug!("Removing tags {:?} from {}", changes.removed, identifier);
        ops.untag_provider(identifier, changes.removed)
            .await
            .map_err(|e| e.into_provider_error(context()).for_resource(id.clone()))?;
    }
    if !changes.upserted.is_empty() {
        debug!("Setting {} tags on {}", changes.upserted.len(), identifier);
        ops.tag_provider(identifier, changes.upserted)
            .await
            .map_err(|e| e.into_provider_error(context()).for_resource(id.clone()))?;
    }

    read(ops, id, identifier).await
}

/// Detach the capacity provider from state without calling ECS
pub fn delete(from: &State) -> ProviderResult<DeleteOutcome> {
    let target = from.identifier.as_deref().unwrap_or(from.id.name.as_str());
    warn!(
        "ECS Capacity Provider ({}) cannot be deleted through the ECS API; removing from state only",
        target
    );
    Ok(DeleteOutcome::Detached {
        reason: format!(
            "ECS has no API to delete capacity providers; {} still exists remotely",
            target
        ),
    })
}

/// Import by short name: the ARN is rebuilt from the caller context
pub async fn import(
    ops: &dyn EcsOperations,
    ctx: &CallerContext,
    id: &ResourceId,
    import_id: &str,
) -> ProviderResult<State> {
    if import_id.is_empty() || import_id.contains(':') || import_id.contains('/') {
        return Err(ProviderError::invalid_identifier(format!(
            "Unexpected capacity provider name ({:?}) for import, expected a short name",
            import_id
        ))
        .for_resource(id.clone()));
    }

    let arn = ctx
        .arn("ecs", format!("capacity-provider/{}", import_id))
        .to_string();
    debug!("Importing ECS Capacity Provider {} as {}", import_id, arn);
    read(ops, id, &arn).await
}
