//! AWS-specific type definitions

use lyra_core::resource::Value;
use lyra_core::schema::{AttributeType, types};

use crate::arn;
use crate::ecs::model::ManagedScalingStatus;

/// ARN string type
pub fn arn() -> AttributeType {
    AttributeType::Custom {
        name: "Arn".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) => arn::validate(s),
            _ => Err("Expected string".to_string()),
        },
    }
}

/// AWS region name, e.g. "us-east-1" or "us-gov-west-1"
///
/// An empty string means unset, leaving the region to the provider.
pub fn aws_region() -> AttributeType {
    AttributeType::Custom {
        name: "Region".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            let Value::String(s) = value else {
                return Err("Expected string".to_string());
            };
            if s.is_empty() || is_region_name(s) {
                Ok(())
            } else {
                Err(format!("Invalid region '{}', expected a name like us-east-1", s))
            }
        },
    }
}

fn is_region_name(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    let Some((number, words)) = parts.split_last() else {
        return false;
    };
    words.len() >= 2
        && words
            .iter()
            .all(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_lowercase()))
        && !number.is_empty()
        && number.chars().all(|c| c.is_ascii_digit())
}

fn int_between(value: &Value, min: i64, max: i64) -> Result<(), String> {
    match value {
        Value::Int(n) if (min..=max).contains(n) => Ok(()),
        Value::Int(n) => Err(format!("{} must be between {} and {}", n, min, max)),
        _ => Err("Expected integer".to_string()),
    }
}

/// Managed scaling step size (1-10000)
pub fn scaling_step_size() -> AttributeType {
    AttributeType::Custom {
        name: "ScalingStepSize".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| int_between(value, 1, 10000),
    }
}

/// Managed scaling target capacity in percent (1-100)
pub fn target_capacity() -> AttributeType {
    AttributeType::Custom {
        name: "TargetCapacity".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| int_between(value, 1, 100),
    }
}

/// "ENABLED" or "DISABLED"
pub fn enabled_disabled() -> AttributeType {
    types::one_of(ManagedScalingStatus::VALUES)
}
