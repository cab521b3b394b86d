//! Inventory group schema definition

use awx_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::types as awx_types;

/// Returns the schema for inventory groups
pub fn inventory_group_schema() -> ResourceSchema {
    ResourceSchema::new("inventory_group")
        .with_description("A group of hosts within an AWX inventory")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Group name, unique within its inventory"),
        )
        .attribute(AttributeSchema::new("description", AttributeType::String).with_default(""))
        .attribute(
            AttributeSchema::new("inventory_id", types::id_string())
                .force_new()
                .with_description("Inventory the group belongs to; changing it replaces the group"),
        )
        .attribute(
            AttributeSchema::new("variables", AttributeType::String)
                .with_default("")
                .with_normalizer(awx_types::json_yaml)
                .with_description("Group variables as YAML or JSON"),
        )
        .attribute(
            AttributeSchema::new("child_group_ids", types::id_list())
                .force_new()
                .with_description(
                    "Groups nested under this one, linked after create; changing them replaces the group",
                ),
        )
}
