//! ECS API calls used by the capacity provider handlers

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_ecs::types as sdk;

use super::model::{
    AutoScalingGroupProvider, CapacityProvider, CreateCapacityProviderRequest, ManagedScaling,
    ManagedScalingStatus, ManagedTerminationProtection,
};
use crate::error::AwsApiError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EcsOperations: Send + Sync {
    /// Create a capacity provider and return it as ECS reports it
    async fn create_provider(
        &self,
        request: CreateCapacityProviderRequest,
    ) -> Result<CapacityProvider, AwsApiError>;

    /// Describe capacity providers by name or ARN, including their tags
    async fn describe_providers(
        &self,
        ids: Vec<String>,
    ) -> Result<Vec<CapacityProvider>, AwsApiError>;

    async fn tag_provider(
        &self,
        arn: &str,
        tags: HashMap<String, String>,
    ) -> Result<(), AwsApiError>;

    async fn untag_provider(&self, arn: &str, keys: Vec<String>) -> Result<(), AwsApiError>;
}

fn sdk_tags(tags: HashMap<String, String>) -> Vec<sdk::Tag> {
    tags.into_iter()
        .map(|(key, value)| sdk::Tag::builder().key(key).value(value).build())
        .collect()
}

fn to_sdk_provider(
    provider: &AutoScalingGroupProvider,
) -> Result<sdk::AutoScalingGroupProvider, AwsApiError> {
    let managed_scaling = provider.managed_scaling.as_ref().map(|ms| {
        sdk::ManagedScaling::builder()
            .set_status(
                ms.status
                    .as_ref()
                    .map(|s| sdk::ManagedScalingStatus::from(s.as_str())),
            )
            .set_target_capacity(ms.target_capacity)
            .set_minimum_scaling_step_size(ms.minimum_scaling_step_size)
            .set_maximum_scaling_step_size(ms.maximum_scaling_step_size)
            .build()
    });

    sdk::AutoScalingGroupProvider::builder()
        .auto_scaling_group_arn(&provider.auto_scaling_group_arn)
        .set_managed_termination_protection(
            provider
                .managed_termination_protection
                .as_ref()
                .map(|p| sdk::ManagedTerminationProtection::from(p.as_str())),
        )
        .set_managed_scaling(managed_scaling)
        .build()
        .map_err(|e| AwsApiError::construction("CreateCapacityProvider", e))
}

fn from_sdk_provider(provider: &sdk::AutoScalingGroupProvider) -> AutoScalingGroupProvider {
    AutoScalingGroupProvider {
        auto_scaling_group_arn: provider.auto_scaling_group_arn().to_string(),
        managed_termination_protection: provider
            .managed_termination_protection()
            .map(|p| ManagedTerminationProtection::from_api(p.as_str())),
        managed_scaling: provider.managed_scaling().map(|ms| ManagedScaling {
            status: ms
                .status()
                .map(|s| ManagedScalingStatus::from_api(s.as_str())),
            target_capacity: ms.target_capacity(),
            minimum_scaling_step_size: ms.minimum_scaling_step_size(),
            maximum_scaling_step_size: ms.maximum_scaling_step_size(),
        }),
    }
}

fn from_sdk(provider: &sdk::CapacityProvider) -> CapacityProvider {
    CapacityProvider {
        arn: provider.capacity_provider_arn().unwrap_or_default().to_string(),
        name: provider.name().unwrap_or_default().to_string(),
        auto_scaling_group_provider: provider.auto_scaling_group_provider().map(from_sdk_provider),
        tags: provider
            .tags()
            .iter()
            .filter_map(|tag| Some((tag.key()?.to_string(), tag.value()?.to_string())))
            .collect(),
    }
}

#[async_trait]
impl EcsOperations for aws_sdk_ecs::Client {
    async fn create_provider(
        &self,
        request: CreateCapacityProviderRequest,
    ) -> Result<CapacityProvider, AwsApiError> {
        let auto_scaling_group_provider = to_sdk_provider(&request.auto_scaling_group_provider)?;
        let tags = (!request.tags.is_empty()).then(|| sdk_tags(request.tags));

        let output = self
            .create_capacity_provider()
            .name(request.name)
            .auto_scaling_group_provider(auto_scaling_group_provider)
            .set_tags(tags)
            .send()
            .await
            .map_err(|e| AwsApiError::from_sdk("CreateCapacityProvider", e))?;

        output.capacity_provider().map(from_sdk).ok_or_else(|| {
            AwsApiError::new(
                "CreateCapacityProvider",
                None,
                "response did not include the capacity provider",
            )
        })
    }

    async fn describe_providers(
        &self,
        ids: Vec<String>,
    ) -> Result<Vec<CapacityProvider>, AwsApiError> {
        let output = self
            .describe_capacity_providers()
            .set_capacity_providers(Some(ids))
            .include(sdk::CapacityProviderField::Tags)
            .send()
            .await
            .map_err(|e| AwsApiError::from_sdk("DescribeCapacityProviders", e))?;

        Ok(output.capacity_providers().iter().map(from_sdk).collect())
    }

    async fn tag_provider(
        &self,
        arn: &str,
        tags: HashMap<String, String>,
    ) -> Result<(), AwsApiError> {
        self.tag_resource()
            .resource_arn(arn)
            .set_tags(Some(sdk_tags(tags)))
            .send()
            .await
            .map_err(|e| AwsApiError::from_sdk("TagResource", e))?;
        Ok(())
    }

    async fn untag_provider(&self, arn: &str, keys: Vec<String>) -> Result<(), AwsApiError> {
        self.untag_resource()
            .resource_arn(arn)
            .set_tag_keys(Some(keys))
            .send()
            .await
            .map_err(|e| AwsApiError::from_sdk("UntagResource", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdk_provider_conversion_keeps_settings() {
        let provider = AutoScalingGroupProvider {
            auto_scaling_group_arn: "arn:aws:autoscaling:us-east-1:123456789012:asg".to_string(),
            managed_termination_protection: Some(ManagedTerminationProtection::Enabled),
            managed_scaling: Some(ManagedScaling {
                status: Some(ManagedScalingStatus::Enabled),
                target_capacity: Some(75),
                ..Default::default()
            }),
        };

        let sdk_provider = to_sdk_provider(&provider).unwrap();
        assert_eq!(
            sdk_provider.managed_scaling().and_then(|ms| ms.maximum_scaling_step_size()),
            None
        );
        assert_eq!(from_sdk_provider(&sdk_provider), provider);
    }

    #[test]
    fn unrecognised_sdk_values_are_kept() {
        let sdk_provider = sdk::AutoScalingGroupProvider::builder()
            .auto_scaling_group_arn("arn:aws:autoscaling:us-east-1:123456789012:asg")
            .managed_termination_protection(sdk::ManagedTerminationProtection::from("PARTIAL"))
            .managed_scaling(
                sdk::ManagedScaling::builder()
                    .status(sdk::ManagedScalingStatus::from("PAUSED"))
                    .build(),
            )
            .build()
            .unwrap();

        let provider = from_sdk_provider(&sdk_provider);
        assert_eq!(
            provider.managed_termination_protection,
            Some(ManagedTerminationProtection::Unknown("PARTIAL".to_string()))
        );
        assert_eq!(
            provider.managed_scaling.and_then(|ms| ms.status),
            Some(ManagedScalingStatus::Unknown("PAUSED".to_string()))
        );
    }

    #[test]
    fn sdk_provider_without_scaling() {
        let provider = AutoScalingGroupProvider::new("arn:aws:autoscaling:us-east-1:123456789012:asg");
        let sdk_provider = to_sdk_provider(&provider).unwrap();
        assert!(sdk_provider.managed_scaling().is_none());
        assert!(sdk_provider.managed_termination_protection().is_none());
    }
}
