//! Resource and data source type definitions
//!
//! Each type pairs a name with its schema; the CRUD handlers live in the
//! per-kind modules as methods on [`crate::AwxProvider`].

pub mod inventory_group;
pub mod job_template;

use awx_core::provider::{ResourceKind, ResourceType};
use awx_core::schema::ResourceSchema;

use crate::schemas;

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $kind:expr, $importable:expr, $schema:path) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn kind(&self) -> ResourceKind {
                $kind
            }
            fn importable(&self) -> bool {
                $importable
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
        }
    };
}

define_resource_type!(
    JobTemplateType,
    "job_template",
    ResourceKind::Resource,
    true,
    schemas::job_template::job_template_schema
);
define_resource_type!(
    InventoryGroupType,
    "inventory_group",
    ResourceKind::Resource,
    true,
    schemas::inventory_group::inventory_group_schema
);

define_resource_type!(
    HostDataSource,
    "host",
    ResourceKind::DataSource,
    false,
    schemas::data_sources::host_schema
);
define_resource_type!(
    InventoryDataSource,
    "inventory",
    ResourceKind::DataSource,
    false,
    schemas::data_sources::inventory_schema
);
define_resource_type!(
    InventoryGroupDataSource,
    "inventory_group",
    ResourceKind::DataSource,
    false,
    schemas::data_sources::inventory_group_schema
);
define_resource_type!(
    JobTemplateDataSource,
    "job_template",
    ResourceKind::DataSource,
    false,
    schemas::data_sources::job_template_schema
);
define_resource_type!(
    ProjectDataSource,
    "project",
    ResourceKind::DataSource,
    false,
    schemas::data_sources::project_schema
);

/// Returns all resource and data source types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(JobTemplateType),
        Box::new(InventoryGroupType),
        Box::new(HostDataSource),
        Box::new(InventoryDataSource),
        Box::new(InventoryGroupDataSource),
        Box::new(JobTemplateDataSource),
        Box::new(ProjectDataSource),
    ]
}

/// Look up a type by name and kind
pub fn find_resource_type(name: &str, kind: ResourceKind) -> Option<Box<dyn ResourceType>> {
    resource_types()
        .into_iter()
        .find(|t| t.name() == name && t.kind() == kind)
}
