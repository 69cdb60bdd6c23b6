//! Execution context for AWS handlers
//!
//! `CallerContext` carries the region, account and partition of the
//! credentials in use. It is passed explicitly to every handler call.
//! `AwsContext` loads the SDK configuration once and builds service clients
//! from it.

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use log::{debug, info};
use lyra_core::provider::{ProviderError, ProviderResult};

use crate::arn::Arn;
use crate::error::AwsApiError;

/// Identity and location of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub region: String,
    pub account_id: String,
    pub partition: String,
}

impl CallerContext {
    pub fn new(
        region: impl Into<String>,
        account_id: impl Into<String>,
        partition: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            account_id: account_id.into(),
            partition: partition.into(),
        }
    }

    /// Build an ARN for a regional resource owned by the caller
    pub fn arn(&self, service: &str, resource: impl Into<String>) -> Arn {
        Arn::new(
            self.partition.clone(),
            service,
            self.region.clone(),
            self.account_id.clone(),
            resource,
        )
    }
}

/// Partition a region belongs to
pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else if region.starts_with("us-iso-") {
        "aws-iso"
    } else if region.starts_with("us-isob-") {
        "aws-iso-b"
    } else {
        "aws"
    }
}

/// Shared AWS configuration plus the resolved caller identity
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    caller: CallerContext,
}

impl AwsContext {
    /// Load SDK configuration and resolve the caller identity via STS
    ///
    /// `region` and `profile` override the SDK default chain when given.
    pub async fn load(region: Option<&str>, profile: Option<&str>) -> ProviderResult<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        let region = config
            .region()
            .map(|r| r.as_ref().to_string())
            .ok_or_else(|| {
                ProviderError::validation(
                    "No AWS region configured; set provider.region or AWS_REGION",
                )
            })?;

        let identity = aws_sdk_sts::Client::new(&config)
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| {
                AwsApiError::from_sdk("GetCallerIdentity", e)
                    .into_provider_error("Error resolving AWS caller identity")
            })?;

        let account_id = identity
            .account()
            .ok_or_else(|| ProviderError::api("No account ID returned from STS GetCallerIdentity"))?
            .to_string();

        let partition = identity
            .arn()
            .and_then(|arn| arn.parse::<Arn>().ok())
            .map(|arn| arn.partition)
            .unwrap_or_else(|| partition_for_region(&region).to_string());

        debug!("Resolved caller partition {} in {}", partition, region);
        info!("AWS account {} validated", account_id);

        Ok(Self {
            config: Arc::new(config),
            caller: CallerContext::new(region, account_id, partition),
        })
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn caller(&self) -> &CallerContext {
        &self.caller
    }

    pub fn route53_client(&self) -> aws_sdk_route53::Client {
        aws_sdk_route53::Client::new(self.sdk_config())
    }

    pub fn ecs_client(&self) -> aws_sdk_ecs::Client {
        aws_sdk_ecs::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("caller", &self.caller)
            .finish_non_exhaustive()
    }
}
