//! Typed capacity provider model shared by the handlers and the API layer

use std::collections::HashMap;

/// `ENABLED` / `DISABLED` switches used by capacity provider settings
///
/// Values ECS reports that this crate does not know are kept verbatim in
/// `Unknown` so state mirrors the service.
macro_rules! switch_enum {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum $name {
            Enabled,
            Disabled,
            Unknown(String),
        }

        impl $name {
            /// Values accepted in configuration
            pub const VALUES: &'static [&'static str] = &["ENABLED", "DISABLED"];

            pub fn as_str(&self) -> &str {
                match self {
                    $name::Enabled => "ENABLED",
                    $name::Disabled => "DISABLED",
                    $name::Unknown(value) => value.as_str(),
                }
            }

            /// Parse a configured value; only `VALUES` are accepted
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    "ENABLED" => Some($name::Enabled),
                    "DISABLED" => Some($name::Disabled),
                    _ => None,
                }
            }

            /// Convert a value returned by ECS
            pub fn from_api(value: &str) -> Self {
                Self::parse(value).unwrap_or_else(|| $name::Unknown(value.to_string()))
            }
        }
    };
}

switch_enum!(
    /// Whether instances with running tasks are protected from scale-in
    ManagedTerminationProtection
);
switch_enum!(ManagedScalingStatus);

/// Managed scaling settings; unset fields are left to the service defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedScaling {
    pub status: Option<ManagedScalingStatus>,
    pub target_capacity: Option<i32>,
    pub minimum_scaling_step_size: Option<i32>,
    pub maximum_scaling_step_size: Option<i32>,
}

impl ManagedScaling {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoScalingGroupProvider {
    pub auto_scaling_group_arn: String,
    pub managed_termination_protection: Option<ManagedTerminationProtection>,
    pub managed_scaling: Option<ManagedScaling>,
}

impl AutoScalingGroupProvider {
    pub fn new(auto_scaling_group_arn: impl Into<String>) -> Self {
        Self {
            auto_scaling_group_arn: auto_scaling_group_arn.into(),
            managed_termination_protection: None,
            managed_scaling: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCapacityProviderRequest {
    pub name: String,
    pub auto_scaling_group_provider: AutoScalingGroupProvider,
    /// Empty means no tags are sent; the API rejects an empty tag list
    pub tags: HashMap<String, String>,
}

/// A capacity provider as described by ECS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityProvider {
    pub arn: String,
    pub name: String,
    pub auto_scaling_group_provider: Option<AutoScalingGroupProvider>,
    pub tags: HashMap<String, String>,
}
