//! AWS API error classification
//!
//! Errors coming back from the SDK are reduced to the operation name, the
//! service error code and message, so handlers can branch on well-known
//! codes instead of matching on Debug output.

use aws_sdk_route53::error::ProvideErrorMetadata;
use lyra_core::provider::ProviderError;
use thiserror::Error;

/// Route 53: the hosted zone does not exist
pub const NO_SUCH_HOSTED_ZONE: &str = "NoSuchHostedZone";

/// Route 53: the authorization being deleted does not exist
pub const VPC_ASSOCIATION_AUTHORIZATION_NOT_FOUND: &str = "VPCAssociationAuthorizationNotFound";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single AWS API call
#[derive(Debug, Error)]
#[error("{operation}: {message}")]
pub struct AwsApiError {
    /// API operation name (e.g., "ListVPCAssociationAuthorizations")
    pub operation: &'static str,
    /// Service error code, when the service returned one
    pub code: Option<String>,
    pub message: String,
    #[source]
    source: Option<BoxError>,
}

impl AwsApiError {
    pub fn new(operation: &'static str, code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            operation,
            code: code.map(str::to_string),
            message: message.into(),
            source: None,
        }
    }

    /// Classify an SDK error by its error metadata
    pub fn from_sdk<E>(operation: &'static str, err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        let code = err.code().map(str::to_string);
        let message = match (err.code(), err.message()) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (Some(code), None) => code.to_string(),
            (None, Some(message)) => message.to_string(),
            (None, None) => err.to_string(),
        };
        Self {
            operation,
            code,
            message,
            source: Some(Box::new(err)),
        }
    }

    /// A request that could not be built locally
    pub fn construction(
        operation: &'static str,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            operation,
            code: None,
            message: format!("failed to build request: {}", err),
            source: Some(Box::new(err)),
        }
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }

    /// Wrap into a provider error with operation context
    pub fn into_provider_error(self, context: impl std::fmt::Display) -> ProviderError {
        ProviderError::api(format!("{}: {}", context, self)).with_cause(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_core::provider::ErrorKind;

    #[test]
    fn has_code_matches_exactly() {
        let err = AwsApiError::new(
            "ListVPCAssociationAuthorizations",
            Some(NO_SUCH_HOSTED_ZONE),
            "No hosted zone found with ID: Z1",
        );
        assert!(err.has_code(NO_SUCH_HOSTED_ZONE));
        assert!(!err.has_code(VPC_ASSOCIATION_AUTHORIZATION_NOT_FOUND));
        assert!(!AwsApiError::new("X", None, "boom").has_code(NO_SUCH_HOSTED_ZONE));
    }

    #[test]
    fn provider_error_keeps_context() {
        let err = AwsApiError::new("CreateCapacityProvider", Some("ClientException"), "denied")
            .into_provider_error("Error creating ECS Capacity Provider (cp1)");
        assert_eq!(err.kind, ErrorKind::Api);
        assert_eq!(
            err.message,
            "Error creating ECS Capacity Provider (cp1): CreateCapacityProvider: denied"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
