//! Lyra AWS Provider
//!
//! Handlers for Route 53 VPC association authorizations and ECS capacity
//! providers, dispatched through the `Provider` trait.

pub mod arn;
pub mod context;
pub mod ecs;
pub mod error;
pub mod route53;
pub mod schemas;
pub mod tags;

use std::sync::Arc;

use lyra_core::provider::{
    BoxFuture, DeleteOutcome, Provider, ProviderError, ProviderResult, ResourceType,
};
use lyra_core::resource::{Resource, ResourceId, State};
use lyra_core::schema::ResourceSchema;

use crate::context::{AwsContext, CallerContext};
use crate::ecs::EcsOperations;
use crate::ecs::capacity_provider;
use crate::route53::Route53Operations;
use crate::route53::authorization;

/// route53_vpc_association_authorization resource type
pub struct VpcAssociationAuthorizationType;

impl ResourceType for VpcAssociationAuthorizationType {
    fn name(&self) -> &'static str {
        authorization::RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        schemas::route53::vpc_association_authorization_schema()
    }
}

/// ecs_capacity_provider resource type
pub struct CapacityProviderType;

impl ResourceType for CapacityProviderType {
    fn name(&self) -> &'static str {
        capacity_provider::RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        schemas::ecs::capacity_provider_schema()
    }
}

/// AWS Provider
pub struct AwsProvider {
    route53: Arc<dyn Route53Operations>,
    ecs: Arc<dyn EcsOperations>,
    caller: CallerContext,
}

impl AwsProvider {
    /// Create a provider backed by the SDK clients of a loaded context
    pub fn new(context: &AwsContext) -> Self {
        Self::with_clients(
            Arc::new(context.route53_client()),
            Arc::new(context.ecs_client()),
            context.caller().clone(),
        )
    }

    /// Create a provider with explicit API implementations
    pub fn with_clients(
        route53: Arc<dyn Route53Operations>,
        ecs: Arc<dyn EcsOperations>,
        caller: CallerContext,
    ) -> Self {
        Self {
            route53,
            ecs,
            caller,
        }
    }

    pub fn caller(&self) -> &CallerContext {
        &self.caller
    }

    fn unknown_type(id: &ResourceId) -> ProviderError {
        ProviderError::unsupported(format!("Unknown resource type: {}", id.resource_type))
            .for_resource(id.clone())
    }

    /// Check configured attributes against the resource schema
    fn validate(&self, resource: &Resource) -> ProviderResult<()> {
        let schema = self
            .resource_types()
            .into_iter()
            .find(|t| t.name() == resource.id.resource_type)
            .map(|t| t.schema())
            .ok_or_else(|| Self::unknown_type(&resource.id))?;

        schema.validate(&resource.attributes).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ProviderError::validation(format!("Invalid configuration: {}", messages.join("; ")))
                .for_resource(resource.id.clone())
        })
    }
}

impl Provider for AwsProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        vec![
            Box::new(VpcAssociationAuthorizationType),
            Box::new(CapacityProviderType),
        ]
    }

    fn read(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            match id.resource_type.as_str() {
                authorization::RESOURCE_TYPE => {
                    authorization::read(self.route53.as_ref(), &id, &identifier).await
                }
                capacity_provider::RESOURCE_TYPE => {
                    capacity_provider::read(self.ecs.as_ref(), &id, &identifier).await
                }
                _ => Err(Self::unknown_type(&id)),
            }
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            self.validate(&resource)?;
            match resource.id.resource_type.as_str() {
                authorization::RESOURCE_TYPE => {
                    authorization::create(self.route53.as_ref(), &self.caller, &resource).await
                }
                capacity_provider::RESOURCE_TYPE => {
                    capacity_provider::create(self.ecs.as_ref(), &resource).await
                }
                _ => Err(Self::unknown_type(&resource.id)),
            }
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            self.validate(&to)?;
            match id.resource_type.as_str() {
                authorization::RESOURCE_TYPE => authorization::update(&id),
                capacity_provider::RESOURCE_TYPE => {
                    capacity_provider::update(self.ecs.as_ref(), &id, &identifier, &from, &to)
                        .await
                }
                _ => Err(Self::unknown_type(&id)),
            }
        })
    }

    fn delete(&self, from: &State) -> BoxFuture<'_, ProviderResult<DeleteOutcome>> {
        let from = from.clone();
        Box::pin(async move {
            match from.id.resource_type.as_str() {
                authorization::RESOURCE_TYPE => {
                    authorization::delete(self.route53.as_ref(), &self.caller, &from).await
                }
                capacity_provider::RESOURCE_TYPE => capacity_provider::delete(&from),
                _ => Err(Self::unknown_type(&from.id)),
            }
        })
    }

    fn import(&self, id: &ResourceId, import_id: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let import_id = import_id.to_string();
        Box::pin(async move {
            match id.resource_type.as_str() {
                capacity_provider::RESOURCE_TYPE => {
                    capacity_provider::import(self.ecs.as_ref(), &self.caller, &id, &import_id)
                        .await
                }
                authorization::RESOURCE_TYPE => Err(ProviderError::unsupported(format!(
                    "Import is not supported for {}",
                    id.resource_type
                ))
                .for_resource(id.clone())),
                _ => Err(Self::unknown_type(&id)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::model::{AutoScalingGroupProvider, CapacityProvider};
    use crate::ecs::operations::MockEcsOperations;
    use crate::route53::operations::MockRoute53Operations;
    use lyra_core::provider::ErrorKind;
    use lyra_core::resource::Value;
    use std::collections::HashMap;

    const ASG_ARN: &str = "arn:aws:autoscaling:us-east-1:123456789012:autoScalingGroup:uuid:autoScalingGroupName/asg";

    fn provider(route53: MockRoute53Operations, ecs: MockEcsOperations) -> AwsProvider {
        AwsProvider::with_clients(
            Arc::new(route53),
            Arc::new(ecs),
            CallerContext::new("us-east-1", "123456789012", "aws"),
        )
    }

    #[test]
    fn exposes_both_resource_types() {
        let provider = provider(MockRoute53Operations::new(), MockEcsOperations::new());
        let names: Vec<&str> = provider.resource_types().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "route53_vpc_association_authorization",
                "ecs_capacity_provider"
            ]
        );
        assert_eq!(schemas::all_schemas().len(), 2);
    }

    #[tokio::test]
    async fn create_validates_before_calling_api() {
        // Mocks without expectations panic if called
        let provider = provider(MockRoute53Operations::new(), MockEcsOperations::new());
        let mut scaling = HashMap::new();
        scaling.insert("target_capacity".to_string(), Value::Int(0));
        let mut asg = HashMap::new();
        asg.insert("auto_scaling_group_arn".to_string(), Value::string(ASG_ARN));
        asg.insert("managed_scaling".to_string(), Value::block(scaling));

        let resource = Resource::new("ecs_capacity_provider", "cp")
            .with_attribute("name", Value::string("cp1"))
            .with_attribute("auto_scaling_group_provider", Value::block(asg));

        let err = provider.create(&resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("target_capacity"));
    }

    #[tokio::test]
    async fn unknown_type_is_unsupported() {
        let provider = provider(MockRoute53Operations::new(), MockEcsOperations::new());
        let id = ResourceId::new("s3_bucket", "logs");
        let err = provider.read(&id, "logs").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn authorization_import_is_unsupported() {
        let provider = provider(MockRoute53Operations::new(), MockEcsOperations::new());
        let id = ResourceId::new("route53_vpc_association_authorization", "peer");
        let err = provider.import(&id, "Z1:V1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn capacity_provider_delete_is_detached() {
        let provider = provider(MockRoute53Operations::new(), MockEcsOperations::new());
        let from = State::existing(ResourceId::new("ecs_capacity_provider", "cp"), HashMap::new())
            .with_identifier("arn:aws:ecs:us-east-1:123456789012:capacity-provider/cp1");
        let outcome = provider.delete(&from).await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::Detached { .. }));
    }

    #[tokio::test]
    async fn dispatches_capacity_provider_read() {
        let mut ecs = MockEcsOperations::new();
        ecs.expect_describe_providers().times(1).returning(|ids| {
            Ok(vec![CapacityProvider {
                arn: ids[0].clone(),
                name: "cp1".to_string(),
                auto_scaling_group_provider: Some(AutoScalingGroupProvider::new(ASG_ARN)),
                tags: HashMap::new(),
            }])
        });
        let provider = provider(MockRoute53Operations::new(), ecs);

        let id = ResourceId::new("ecs_capacity_provider", "cp");
        let state = provider
            .read(&id, "arn:aws:ecs:us-east-1:123456789012:capacity-provider/cp1")
            .await
            .unwrap();
        assert!(state.exists);
    }
}
