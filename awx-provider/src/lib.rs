//! AWX Provider
//!
//! Manages AWX (Ansible Tower) job templates and inventory groups and reads
//! hosts, inventories, groups, job templates and projects.
//!
//! ## Module Structure
//!
//! - `api` - `AwxApi` client trait, HTTP and in-memory implementations, models
//! - `provider` - AwxProvider and its construction
//! - `resources` - Resource type registry and CRUD handlers
//! - `data_sources` - Name lookups
//! - `schemas` - Attribute schemas
//! - `reconcile`, `wait`, `link`, `translate` - Steps shared by the handlers
//! - `config` - Provider block and environment settings

pub mod api;
pub mod config;
pub mod data_sources;
pub mod link;
pub mod provider;
pub mod reconcile;
pub mod resources;
pub mod schemas;
pub mod translate;
pub mod utils;
pub mod wait;

// Re-export main types
pub use api::{AwxApi, HttpAwxClient, InMemoryAwx};
pub use config::{ConfigError, ProviderConfig};
pub use provider::AwxProvider;
pub use wait::WaitOptions;

use awx_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult, ResourceType};
use awx_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

fn unknown_type(id: &ResourceId) -> ProviderError {
    ProviderError::unsupported(format!("Unknown resource type: {}", id.resource_type))
        .for_resource(id.clone())
}

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for AwxProvider {
    fn name(&self) -> &'static str {
        "awx"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move {
            match id.resource_type.as_str() {
                "job_template" => self.read_job_template(id, identifier.as_deref()).await,
                "inventory_group" => self.read_inventory_group(id, identifier.as_deref()).await,
                _ => Err(unknown_type(&id)),
            }
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            match resource.id.resource_type.as_str() {
                "job_template" => self.create_job_template(resource).await,
                "inventory_group" => self.create_inventory_group(resource).await,
                _ => Err(unknown_type(&resource.id)),
            }
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            match id.resource_type.as_str() {
                "job_template" => {
                    self.update_job_template(id, &identifier, &from, to)
                        .await
                }
                "inventory_group" => self.update_inventory_group(id, &identifier, to).await,
                _ => Err(unknown_type(&id)),
            }
        })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            match id.resource_type.as_str() {
                "job_template" => self.delete_job_template(id, &identifier).await,
                "inventory_group" => self.delete_inventory_group(id, &identifier).await,
                _ => Err(unknown_type(&id)),
            }
        })
    }

    fn import(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            match id.resource_type.as_str() {
                "job_template" => self.import_job_template(id, &identifier).await,
                "inventory_group" => self.import_inventory_group(id, &identifier).await,
                _ => Err(unknown_type(&id)),
            }
        })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            match resource.id.resource_type.as_str() {
                "host" => self.read_host_data_source(&resource).await,
                "inventory" => self.read_inventory_data_source(&resource).await,
                "inventory_group" => self.read_inventory_group_data_source(&resource).await,
                "job_template" => self.read_job_template_data_source(&resource).await,
                "project" => self.read_project_data_source(&resource).await,
                _ => Err(unknown_type(&resource.id)),
            }
        })
    }
}
