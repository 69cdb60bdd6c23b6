//! Conversion between the `auto_scaling_group_provider` block and the typed model
//!
//! Expansion drops unset leaves (zero numbers, empty strings, empty blocks) so
//! the service applies its own defaults. Flattening writes back every leaf the
//! service reported, so defaults show up in state.

use std::collections::HashMap;

use lyra_core::decode::AttributeReader;
use lyra_core::resource::Value;
use lyra_core::schema::TypeError;

use super::model::{
    AutoScalingGroupProvider, ManagedScaling, ManagedScalingStatus, ManagedTerminationProtection,
};

fn int_leaf(reader: &AttributeReader<'_>, name: &str) -> Result<Option<i32>, TypeError> {
    reader
        .non_zero_int(name)?
        .map(|n| {
            i32::try_from(n).map_err(|_| {
                TypeError::ValidationFailed {
                    message: format!("{} is out of range", n),
                }
                .in_attribute(name)
            })
        })
        .transpose()
}

fn switch_leaf<T>(
    reader: &AttributeReader<'_>,
    name: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, TypeError> {
    reader
        .non_empty_string(name)?
        .map(|s| {
            parse(s).ok_or_else(|| {
                TypeError::InvalidEnumVariant {
                    value: s.to_string(),
                    expected: ManagedScalingStatus::VALUES
                        .iter()
                        .map(|v| v.to_string())
                        .collect(),
                }
                .in_attribute(name)
            })
        })
        .transpose()
}

fn expand_managed_scaling(reader: &AttributeReader<'_>) -> Result<ManagedScaling, TypeError> {
    Ok(ManagedScaling {
        status: switch_leaf(reader, "status", ManagedScalingStatus::parse)?,
        target_capacity: int_leaf(reader, "target_capacity")?,
        minimum_scaling_step_size: int_leaf(reader, "minimum_scaling_step_size")?,
        maximum_scaling_step_size: int_leaf(reader, "maximum_scaling_step_size")?,
    })
}

/// Build the typed provider from the attributes of a capacity provider
pub fn expand(attributes: &HashMap<String, Value>) -> Result<AutoScalingGroupProvider, TypeError> {
    let block = "auto_scaling_group_provider";
    let reader = AttributeReader::new(attributes).required_block(block)?;
    let within = |e: TypeError| e.in_attribute(block);

    let auto_scaling_group_arn = reader
        .required_string("auto_scaling_group_arn")
        .map_err(within)?;
    let managed_termination_protection = switch_leaf(
        &reader,
        "managed_termination_protection",
        ManagedTerminationProtection::parse,
    )
    .map_err(within)?;

    let managed_scaling = match reader.single_block("managed_scaling").map_err(within)? {
        Some(ms) => {
            let scaling = expand_managed_scaling(&ms)
                .map_err(|e| within(e.in_attribute("managed_scaling")))?;
            (!scaling.is_empty()).then_some(scaling)
        }
        None => None,
    };

    Ok(AutoScalingGroupProvider {
        auto_scaling_group_arn: auto_scaling_group_arn.to_string(),
        managed_termination_protection,
        managed_scaling,
    })
}

/// Write a provider back as a single-element `auto_scaling_group_provider` block
pub fn flatten(provider: &AutoScalingGroupProvider) -> Value {
    let mut p = HashMap::new();
    p.insert(
        "auto_scaling_group_arn".to_string(),
        Value::string(&provider.auto_scaling_group_arn),
    );
    p.insert(
        "managed_termination_protection".to_string(),
        Value::string(
            provider
                .managed_termination_protection
                .as_ref()
                .map(|m| m.as_str())
                .unwrap_or_default(),
        ),
    );

    if let Some(ms) = &provider.managed_scaling {
        let int = |n: Option<i32>| Value::Int(i64::from(n.unwrap_or_default()));
        let mut scaling = HashMap::new();
        scaling.insert(
            "maximum_scaling_step_size".to_string(),
            int(ms.maximum_scaling_step_size),
        );
        scaling.insert(
            "minimum_scaling_step_size".to_string(),
            int(ms.minimum_scaling_step_size),
        );
        scaling.insert(
            "status".to_string(),
            Value::string(ms.status.as_ref().map(|s| s.as_str()).unwrap_or_default()),
        );
        scaling.insert("target_capacity".to_string(), int(ms.target_capacity));
        p.insert("managed_scaling".to_string(), Value::block(scaling));
    }

    Value::block(p)
}
