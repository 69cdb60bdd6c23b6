//! route53_vpc_association_authorization handlers

use std::collections::HashMap;

use log::{debug, info, warn};
use lyra_core::decode::AttributeReader;
use lyra_core::provider::{DeleteOutcome, ProviderError, ProviderResult};
use lyra_core::resource::{Resource, ResourceId, State, Value};

use super::identifier::AuthorizationId;
use super::lookup::{VpcLookup, find_authorized_vpc};
use super::operations::{AuthorizedVpc, Route53Operations};
use crate::context::CallerContext;
use crate::error::{NO_SUCH_HOSTED_ZONE, VPC_ASSOCIATION_AUTHORIZATION_NOT_FOUND};

pub const RESOURCE_TYPE: &str = "route53_vpc_association_authorization";

fn parse_identifier(id: &ResourceId, identifier: &str) -> ProviderResult<AuthorizationId> {
    identifier.parse().map_err(|e| {
        ProviderError::invalid_identifier(format!("{}", e))
            .for_resource(id.clone())
            .with_cause(e)
    })
}

/// Authorize the configured VPC, then read the authorization back
pub async fn create(
    ops: &dyn Route53Operations,
    ctx: &CallerContext,
    resource: &Resource,
) -> ProviderResult<State> {
    let invalid = |e: lyra_core::schema::TypeError| {
        ProviderError::validation(e.to_string()).for_resource(resource.id.clone())
    };
    let attrs = AttributeReader::new(&resource.attributes);
    let zone_id = attrs.required_string("zone_id").map_err(invalid)?;
    let vpc_id = attrs.required_string("vpc_id").map_err(invalid)?;
    let vpc_region = attrs
        .non_empty_string("vpc_region")
        .map_err(invalid)?
        .unwrap_or(&ctx.region);

    let vpc = AuthorizedVpc::new(vpc_id, vpc_region);
    info!(
        "Creating VPC Association Authorization: zone {} vpc {} ({})",
        zone_id, vpc.vpc_id, vpc.vpc_region
    );
    ops.authorize_vpc_association(zone_id, &vpc)
        .await
        .map_err(|e| {
            e.into_provider_error("Error creating VPC Association Authorization")
                .for_resource(resource.id.clone())
        })?;

    let identifier = AuthorizationId::new(zone_id, vpc_id).to_string();
    let state = read(ops, &resource.id, &identifier)
        .await
        .map_err(|e| e.with_identifier(identifier.clone()))?;
    if !state.exists {
        return Err(ProviderError::api(format!(
            "VPC Association Authorization {} not found after creation",
            identifier
        ))
        .for_resource(resource.id.clone())
        .with_identifier(identifier));
    }
    Ok(state)
}

/// Read the authorization named by `identifier`
///
/// A missing zone or a VPC that is no longer authorized reads as not found.
pub async fn read(
    ops: &dyn Route53Operations,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    debug!("Reading VPC Association Authorization {}", identifier);
    let key = parse_identifier(id, identifier)?;

    let vpc = match find_authorized_vpc(ops, &key.zone_id, &key.vpc_id)
        .await
        .map_err(|e| e.for_resource(id.clone()))?
    {
        VpcLookup::Found(vpc) => vpc,
        VpcLookup::ZoneNotFound => {
            warn!(
                "Route 53 Hosted Zone ({}) not found, removing from state",
                key.zone_id
            );
            return Ok(State::not_found(id.clone()));
        }
        VpcLookup::NotAuthorized => {
            warn!(
                "Route 53 VPC ({}) Association Authorization for Hosted Zone ({}) not found, removing from state",
                key.vpc_id, key.zone_id
            );
            return Ok(State::not_found(id.clone()));
        }
    };

    let mut attributes = HashMap::new();
    attributes.insert("zone_id".to_string(), Value::string(&key.zone_id));
    attributes.insert("vpc_id".to_string(), Value::string(vpc.vpc_id));
    attributes.insert("vpc_region".to_string(), Value::string(vpc.vpc_region));

    Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
}

/// Every attribute forces replacement, so there is nothing to update in place
pub fn update(id: &ResourceId) -> ProviderResult<State> {
    Err(ProviderError::unsupported(
        "VPC Association Authorizations cannot be updated in place; every attribute forces replacement",
    )
    .for_resource(id.clone()))
}

/// Revoke the authorization recorded in `from`
///
/// The VPC region comes from the stored state, falling back to the caller's
/// region. An authorization or zone that is already gone counts as deleted.
pub async fn delete(
    ops: &dyn Route53Operations,
    ctx: &CallerContext,
    from: &State,
) -> ProviderResult<DeleteOutcome> {
    let identifier = from.identifier.as_deref().ok_or_else(|| {
        ProviderError::invalid_identifier("No identifier recorded for VPC Association Authorization")
            .for_resource(from.id.clone())
    })?;
    let key = parse_identifier(&from.id, identifier)?;

    let vpc_region = AttributeReader::new(&from.attributes)
        .non_empty_string("vpc_region")
        .map_err(|e| ProviderError::validation(e.to_string()).for_resource(from.id.clone()))?
        .unwrap_or(&ctx.region);
    let vpc = AuthorizedVpc::new(key.vpc_id.as_str(), vpc_region);

    debug!(
        "Deauthorizing Route 53 VPC ({}) Association: {}",
        vpc.vpc_id, key.zone_id
    );
    match ops.revoke_vpc_association(&key.zone_id, &vpc).await {
        Ok(()) => {
            info!("Deleted VPC Association Authorization {}", identifier);
            Ok(DeleteOutcome::Deleted)
        }
        Err(e)
            if e.has_code(NO_SUCH_HOSTED_ZONE)
                || e.has_code(VPC_ASSOCIATION_AUTHORIZATION_NOT_FOUND) =>
        {
            info!(
                "VPC Association Authorization {} already gone ({})",
                identifier, e.message
            );
            Ok(DeleteOutcome::Deleted)
        }
        Err(e) => Err(e
            .into_provider_error(format!(
                "Error deleting Route 53 VPC ({}) Association Authorization for Hosted Zone ({})",
                key.vpc_id, key.zone_id
            ))
            .for_resource(from.id.clone())),
    }
}
