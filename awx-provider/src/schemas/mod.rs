//! AWX resource and data source schema definitions

pub mod data_sources;
pub mod inventory_group;
pub mod job_template;
pub mod types;

use awx_core::schema::ResourceSchema;

/// Returns all managed resource schemas
pub fn resource_schemas() -> Vec<ResourceSchema> {
    vec![
        job_template::job_template_schema(),
        inventory_group::inventory_group_schema(),
    ]
}

/// Returns all data source schemas
pub fn data_source_schemas() -> Vec<ResourceSchema> {
    vec![
        data_sources::host_schema(),
        data_sources::inventory_schema(),
        data_sources::inventory_group_schema(),
        data_sources::job_template_schema(),
        data_sources::project_schema(),
    ]
}
