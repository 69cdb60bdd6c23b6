//! Route 53 resource schema definitions

use lyra_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::types as aws_types;
use crate::route53::authorization::RESOURCE_TYPE;

/// Returns the schema for route53_vpc_association_authorization
pub fn vpc_association_authorization_schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description(
            "Authorizes a VPC, possibly in another account, to associate with a private hosted zone",
        )
        .attribute(
            AttributeSchema::new("zone_id", AttributeType::String)
                .required()
                .force_new()
                .with_description("ID of the private hosted zone"),
        )
        .attribute(
            AttributeSchema::new("vpc_id", AttributeType::String)
                .required()
                .force_new()
                .with_description("ID of the VPC to authorize"),
        )
        .attribute(
            AttributeSchema::new("vpc_region", aws_types::aws_region())
                .computed()
                .force_new()
                .with_description("Region of the VPC; defaults to the provider region"),
        )
}

pub fn schemas() -> Vec<ResourceSchema> {
    vec![vpc_association_authorization_schema()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_core::resource::Value;
    use std::collections::HashMap;

    fn attrs(pairs: Vec<(&str, Value)>) -> HashMap<String, Value> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn requires_zone_and_vpc() {
        let schema = vpc_association_authorization_schema();
        assert!(
            schema
                .validate(&attrs(vec![
                    ("zone_id", Value::string("Z1")),
                    ("vpc_id", Value::string("V1")),
                ]))
                .is_ok()
        );
        let errors = schema
            .validate(&attrs(vec![("zone_id", Value::string("Z1"))]))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn empty_region_means_unset() {
        let schema = vpc_association_authorization_schema();
        let configured = attrs(vec![
            ("zone_id", Value::string("Z1")),
            ("vpc_id", Value::string("V1")),
            ("vpc_region", Value::string("")),
        ]);
        assert!(schema.validate(&configured).is_ok());

        let current = attrs(vec![
            ("zone_id", Value::string("Z1")),
            ("vpc_id", Value::string("V1")),
            ("vpc_region", Value::string("us-east-1")),
        ]);
        assert!(schema.replacement_attributes(&current, &configured).is_empty());
    }

    #[test]
    fn every_attribute_forces_replacement() {
        let schema = vpc_association_authorization_schema();
        let current = attrs(vec![
            ("zone_id", Value::string("Z1")),
            ("vpc_id", Value::string("V1")),
            ("vpc_region", Value::string("us-east-1")),
        ]);

        let unset_region = attrs(vec![
            ("zone_id", Value::string("Z1")),
            ("vpc_id", Value::string("V1")),
        ]);
        assert!(schema.replacement_attributes(&current, &unset_region).is_empty());

        let moved = attrs(vec![
            ("zone_id", Value::string("Z2")),
            ("vpc_id", Value::string("V1")),
            ("vpc_region", Value::string("eu-west-1")),
        ]);
        assert_eq!(
            schema.replacement_attributes(&current, &moved),
            vec!["vpc_region".to_string(), "zone_id".to_string()]
        );
    }
}
