//! Route 53 API calls used by the authorization handlers
//!
//! The handlers only see [`Route53Operations`], which lets tests swap the
//! SDK client for a mock.

use async_trait::async_trait;
use aws_sdk_route53::types::{Vpc, VpcRegion};

use crate::error::AwsApiError;

/// A VPC as Route 53 reports it in an authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedVpc {
    pub vpc_id: String,
    pub vpc_region: String,
}

impl AuthorizedVpc {
    pub fn new(vpc_id: impl Into<String>, vpc_region: impl Into<String>) -> Self {
        Self {
            vpc_id: vpc_id.into(),
            vpc_region: vpc_region.into(),
        }
    }

    fn to_sdk(&self) -> Vpc {
        Vpc::builder()
            .vpc_id(&self.vpc_id)
            .vpc_region(VpcRegion::from(self.vpc_region.as_str()))
            .build()
    }

    fn from_sdk(vpc: &Vpc) -> Self {
        Self {
            vpc_id: vpc.vpc_id().unwrap_or_default().to_string(),
            vpc_region: vpc
                .vpc_region()
                .map(|r| r.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

/// One page of `ListVPCAssociationAuthorizations`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationPage {
    pub vpcs: Vec<AuthorizedVpc>,
    pub next_token: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Route53Operations: Send + Sync {
    /// Authorize a VPC to associate with a private hosted zone
    async fn authorize_vpc_association(
        &self,
        zone_id: &str,
        vpc: &AuthorizedVpc,
    ) -> Result<(), AwsApiError>;

    /// First page of VPCs authorized for a hosted zone
    async fn list_authorized_vpcs(&self, zone_id: &str) -> Result<AuthorizationPage, AwsApiError>;

    /// Remove an authorization
    async fn revoke_vpc_association(
        &self,
        zone_id: &str,
        vpc: &AuthorizedVpc,
    ) -> Result<(), AwsApiError>;
}

#[async_trait]
impl Route53Operations for aws_sdk_route53::Client {
    async fn authorize_vpc_association(
        &self,
        zone_id: &str,
        vpc: &AuthorizedVpc,
    ) -> Result<(), AwsApiError> {
        self.create_vpc_association_authorization()
            .hosted_zone_id(zone_id)
            .vpc(vpc.to_sdk())
            .send()
            .await
            .map_err(|e| AwsApiError::from_sdk("CreateVPCAssociationAuthorization", e))?;
        Ok(())
    }

    async fn list_authorized_vpcs(&self, zone_id: &str) -> Result<AuthorizationPage, AwsApiError> {
        let output = self
            .list_vpc_association_authorizations()
            .hosted_zone_id(zone_id)
            .send()
            .await
            .map_err(|e| AwsApiError::from_sdk("ListVPCAssociationAuthorizations", e))?;

        Ok(AuthorizationPage {
            vpcs: output.vpcs().iter().map(AuthorizedVpc::from_sdk).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn revoke_vpc_association(
        &self,
        zone_id: &str,
        vpc: &AuthorizedVpc,
    ) -> Result<(), AwsApiError> {
        self.delete_vpc_association_authorization()
            .hosted_zone_id(zone_id)
            .vpc(vpc.to_sdk())
            .send()
            .await
            .map_err(|e| AwsApiError::from_sdk("DeleteVPCAssociationAuthorization", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdk_conversion_keeps_region() {
        let vpc = AuthorizedVpc::new("vpc-1", "eu-west-1");
        let sdk = vpc.to_sdk();
        assert_eq!(sdk.vpc_id(), Some("vpc-1"));
        assert_eq!(AuthorizedVpc::from_sdk(&sdk), vpc);
    }

    #[test]
    fn missing_region_reads_as_empty() {
        let sdk = Vpc::builder().vpc_id("vpc-1").build();
        assert_eq!(
            AuthorizedVpc::from_sdk(&sdk),
            AuthorizedVpc::new("vpc-1", "")
        );
    }
}
