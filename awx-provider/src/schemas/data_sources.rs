//! Data source schema definitions
//!
//! Every data source is looked up by `name`; all other attributes are
//! filled in from the first matching record.

use awx_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::types as awx_types;

fn lookup(resource_type: &str, description: &str) -> ResourceSchema {
    ResourceSchema::new(resource_type)
        .with_description(description)
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_description("Name to look up"),
        )
        .attribute(AttributeSchema::new("id", AttributeType::Int).computed())
}

pub fn host_schema() -> ResourceSchema {
    lookup("host", "Look up an AWX host by name")
        .attribute(AttributeSchema::new("inventory_id", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("description", AttributeType::String).computed())
        .attribute(AttributeSchema::new("enabled", AttributeType::Bool).computed())
}

pub fn inventory_schema() -> ResourceSchema {
    lookup("inventory", "Look up an AWX inventory by name")
        .attribute(AttributeSchema::new("organization_id", AttributeType::Int).computed())
}

pub fn inventory_group_schema() -> ResourceSchema {
    lookup("inventory_group", "Look up an inventory group by name").attribute(
        AttributeSchema::new("inventory_id", AttributeType::Int)
            .computed()
            .optional_computed()
            .with_description("Restrict the lookup to this inventory"),
    )
}

pub fn job_template_schema() -> ResourceSchema {
    lookup("job_template", "Look up a job template by name")
        .attribute(
            AttributeSchema::new("prompt_inventory", AttributeType::Bool)
                .computed()
                .with_description("Whether an inventory must be passed at launch"),
        )
        .attribute(AttributeSchema::new("host_config_key", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("callback_url", AttributeType::String)
                .computed()
                .with_description("Provisioning callback URL, if callbacks are enabled"),
        )
        .attribute(
            AttributeSchema::new("survey_spec", awx_types::survey_spec())
                .computed()
                .with_description("Survey questions, present when the survey is enabled"),
        )
}

pub fn project_schema() -> ResourceSchema {
    lookup("project", "Look up an AWX project by name")
        .attribute(AttributeSchema::new("scm_type", AttributeType::String).computed())
        .attribute(AttributeSchema::new("scm_url", AttributeType::String).computed())
}
