//! ECS resource schema definitions

use lyra_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::types as aws_types;
use crate::ecs::capacity_provider::RESOURCE_TYPE;

fn managed_scaling_block() -> BlockSchema {
    BlockSchema::new()
        .max_items(1)
        .attribute(
            AttributeSchema::new("maximum_scaling_step_size", aws_types::scaling_step_size())
                .computed(),
        )
        .attribute(
            AttributeSchema::new("minimum_scaling_step_size", aws_types::scaling_step_size())
                .computed(),
        )
        .attribute(AttributeSchema::new("status", aws_types::enabled_disabled()).computed())
        .attribute(
            AttributeSchema::new("target_capacity", aws_types::target_capacity())
                .computed()
                .with_description("Target utilization of the Auto Scaling group, in percent"),
        )
}

fn auto_scaling_group_provider_block() -> BlockSchema {
    BlockSchema::new()
        .max_items(1)
        .attribute(AttributeSchema::new("auto_scaling_group_arn", aws_types::arn()).required())
        .attribute(
            AttributeSchema::new(
                "managed_termination_protection",
                aws_types::enabled_disabled(),
            )
            .computed(),
        )
        .attribute(
            AttributeSchema::new("managed_scaling", managed_scaling_block().into_type()).computed(),
        )
}

/// Returns the schema for ecs_capacity_provider
pub fn capacity_provider_schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("ECS capacity provider backed by an Auto Scaling group")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("arn", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new(
                "auto_scaling_group_provider",
                auto_scaling_group_provider_block().into_type(),
            )
            .required()
            .force_new(),
        )
        .attribute(
            AttributeSchema::new("tags", types::tags())
                .with_description("Tags; keys starting with aws: are ignored"),
        )
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![capacity_provider_schema()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_core::resource::Value;
    use std::collections::HashMap;

    const ASG_ARN: &str = "arn:aws:autoscaling:us-east-1:123456789012:autoScalingGroup:uuid:autoScalingGroupName/asg";

    fn map(pairs: Vec<(&str, Value)>) -> HashMap<String, Value> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn config(scaling: Option<HashMap<String, Value>>) -> HashMap<String, Value> {
        let mut provider = map(vec![("auto_scaling_group_arn", Value::string(ASG_ARN))]);
        if let Some(scaling) = scaling {
            provider.insert("managed_scaling".to_string(), Value::block(scaling));
        }
        map(vec![
            ("name", Value::string("cp1")),
            ("auto_scaling_group_provider", Value::block(provider)),
        ])
    }

    #[test]
    fn accepts_minimal_configuration() {
        assert!(capacity_provider_schema().validate(&config(None)).is_ok());
    }

    #[test]
    fn rejects_out_of_range_target_capacity() {
        let attrs = config(Some(map(vec![("target_capacity", Value::Int(150))])));
        let errors = capacity_provider_schema().validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("target_capacity"));
    }

    #[test]
    fn rejects_second_provider_block() {
        let provider = map(vec![("auto_scaling_group_arn", Value::string(ASG_ARN))]);
        let attrs = map(vec![
            ("name", Value::string("cp1")),
            (
                "auto_scaling_group_provider",
                Value::List(vec![Value::Map(provider.clone()), Value::Map(provider)]),
            ),
        ]);
        assert!(capacity_provider_schema().validate(&attrs).is_err());
    }

    #[test]
    fn tags_update_in_place() {
        let schema = capacity_provider_schema();
        let current = config(None);
        let mut desired = config(None);
        desired.insert(
            "tags".to_string(),
            Value::Map(map(vec![("Env", Value::string("prod"))])),
        );
        assert!(schema.replacement_attributes(&current, &desired).is_empty());
    }

    #[test]
    fn computed_scaling_does_not_force_replacement() {
        let schema = capacity_provider_schema();
        let current = config(Some(map(vec![
            ("target_capacity", Value::Int(100)),
            ("status", Value::string("ENABLED")),
            ("minimum_scaling_step_size", Value::Int(1)),
            ("maximum_scaling_step_size", Value::Int(10000)),
        ])));
        assert!(schema.replacement_attributes(&current, &config(None)).is_empty());

        let changed = config(Some(map(vec![("target_capacity", Value::Int(50))])));
        assert_eq!(
            schema.replacement_attributes(&current, &changed),
            vec!["auto_scaling_group_provider".to_string()]
        );
    }
}
