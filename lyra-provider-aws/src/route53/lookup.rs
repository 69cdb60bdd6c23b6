//! Find an authorization by scanning the zone's authorization list
//!
//! Route 53 has no get-by-key call for authorizations, so lookups fetch the
//! authorized VPCs of the zone and match on the VPC ID.

use log::{debug, warn};
use lyra_core::provider::{ProviderError, ProviderResult};

use super::operations::{AuthorizedVpc, Route53Operations};
use crate::error::NO_SUCH_HOSTED_ZONE;

/// Longest hosted zone ID the list call accepts
pub const MAX_ZONE_ID_LEN: usize = 32;

/// Result of looking up one authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VpcLookup {
    Found(AuthorizedVpc),
    /// The zone exists but the VPC is not authorized for it
    NotAuthorized,
    ZoneNotFound,
}

/// First entry whose VPC ID matches exactly
pub fn scan(vpcs: &[AuthorizedVpc], vpc_id: &str) -> Option<AuthorizedVpc> {
    vpcs.iter().find(|vpc| vpc.vpc_id == vpc_id).cloned()
}

/// Check the list request locally before sending it
pub fn validate_list_input(zone_id: &str) -> ProviderResult<()> {
    let problem = if zone_id.is_empty() {
        "HostedZoneId must not be empty"
    } else if zone_id.chars().count() > MAX_ZONE_ID_LEN {
        "HostedZoneId must be at most 32 characters"
    } else {
        return Ok(());
    };
    Err(ProviderError::validation(format!(
        "Bad input {{ HostedZoneId: {:?} }} for List VPC Association Authorizations: {}",
        zone_id, problem
    )))
}

/// Look up the authorization of `vpc_id` on `zone_id`
///
/// Only the first page of results is scanned.
pub async fn find_authorized_vpc(
    ops: &dyn Route53Operations,
    zone_id: &str,
    vpc_id: &str,
) -> ProviderResult<VpcLookup> {
    validate_list_input(zone_id)?;

    let page = match ops.list_authorized_vpcs(zone_id).await {
        Ok(page) => page,
        Err(e) if e.has_code(NO_SUCH_HOSTED_ZONE) => return Ok(VpcLookup::ZoneNotFound),
        Err(e) => {
            return Err(e.into_provider_error(format!(
                "Error getting Route 53 VPC ({}) Association Authorization for Hosted Zone ({})",
                vpc_id, zone_id
            )));
        }
    };

    if let Some(token) = &page.next_token {
        warn!(
            "Route 53 Hosted Zone ({}) has more VPC Association Authorizations (next token {}); only the first page is checked",
            zone_id, token
        );
    }
    debug!(
        "Hosted Zone ({}) lists {} authorized VPCs",
        zone_id,
        page.vpcs.len()
    );

    Ok(match scan(&page.vpcs, vpc_id) {
        Some(vpc) => VpcLookup::Found(vpc),
        None => VpcLookup::NotAuthorized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AwsApiError;
    use crate::route53::operations::{AuthorizationPage, MockRoute53Operations};
    use lyra_core::provider::ErrorKind;

    fn page(vpcs: &[&str]) -> AuthorizationPage {
        AuthorizationPage {
            vpcs: vpcs
                .iter()
                .map(|id| AuthorizedVpc::new(*id, "us-east-1"))
                .collect(),
            next_token: None,
        }
    }

    #[test]
    fn scan_matches_exact_vpc_id() {
        let vpcs = page(&["v1", "v2"]).vpcs;
        assert_eq!(scan(&vpcs, "v2"), Some(AuthorizedVpc::new("v2", "us-east-1")));
        assert_eq!(scan(&vpcs, "v3"), None);
        assert_eq!(scan(&vpcs, "v"), None);
    }

    #[test]
    fn validation_rejects_empty_and_long_zone_ids() {
        assert!(validate_list_input("Z1").is_ok());

        let err = validate_list_input("").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let long = "Z".repeat(33);
        let err = validate_list_input(&long).unwrap_err();
        assert!(err.message.contains(&long));
    }

    #[tokio::test]
    async fn found_and_not_authorized() {
        let mut ops = MockRoute53Operations::new();
        ops.expect_list_authorized_vpcs()
            .times(2)
            .returning(|_| Ok(page(&["v1", "v2"])));

        assert_eq!(
            find_authorized_vpc(&ops, "Z1", "v2").await.unwrap(),
            VpcLookup::Found(AuthorizedVpc::new("v2", "us-east-1"))
        );
        assert_eq!(
            find_authorized_vpc(&ops, "Z1", "v3").await.unwrap(),
            VpcLookup::NotAuthorized
        );
    }

    #[tokio::test]
    async fn truncated_page_is_listed_once() {
        let mut ops = MockRoute53Operations::new();
        ops.expect_list_authorized_vpcs()
            .times(2)
            .returning(|_| {
                Ok(AuthorizationPage {
                    next_token: Some("page-2".to_string()),
                    ..page(&["v1"])
                })
            });

        assert_eq!(
            find_authorized_vpc(&ops, "Z1", "v1").await.unwrap(),
            VpcLookup::Found(AuthorizedVpc::new("v1", "us-east-1"))
        );
        // A VPC that would only appear on the next page is not authorized
        assert_eq!(
            find_authorized_vpc(&ops, "Z1", "v9").await.unwrap(),
            VpcLookup::NotAuthorized
        );
    }

    #[tokio::test]
    async fn missing_zone_is_not_an_error() {
        let mut ops = MockRoute53Operations::new();
        ops.expect_list_authorized_vpcs().returning(|_| {
            Err(AwsApiError::new(
                "ListVPCAssociationAuthorizations",
                Some(NO_SUCH_HOSTED_ZONE),
                "No hosted zone found",
            ))
        });

        assert_eq!(
            find_authorized_vpc(&ops, "Z1", "v1").await.unwrap(),
            VpcLookup::ZoneNotFound
        );
    }

    #[tokio::test]
    async fn other_errors_propagate_with_context() {
        let mut ops = MockRoute53Operations::new();
        ops.expect_list_authorized_vpcs().returning(|_| {
            Err(AwsApiError::new(
                "ListVPCAssociationAuthorizations",
                Some("Throttling"),
                "Rate exceeded",
            ))
        });

        let err = find_authorized_vpc(&ops, "Z1", "v1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Api);
        assert!(err.message.contains("Hosted Zone (Z1)"));
        assert!(err.message.contains("Rate exceeded"));
    }

    #[tokio::test]
    async fn invalid_zone_never_calls_the_api() {
        let ops = MockRoute53Operations::new();
        let err = find_authorized_vpc(&ops, "", "v1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
