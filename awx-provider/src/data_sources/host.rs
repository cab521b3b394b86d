//! Host data source

use std::collections::HashMap;

use awx_core::provider::ProviderResult;
use awx_core::resource::{Resource, State, Value};

use super::{NameLookup, first_match, lookup_error};
use crate::provider::AwxProvider;
use crate::schemas::data_sources::host_schema;

impl AwxProvider {
    pub(crate) async fn read_host_data_source(&self, resource: &Resource) -> ProviderResult<State> {
        let lookup = NameLookup::from_resource(&host_schema(), resource)?;
        let hosts = self
            .api()
            .list_hosts(&lookup.filters())
            .await
            .map_err(lookup_error(resource))?;

        Ok(first_match(resource, hosts, |host| {
            let mut attrs = HashMap::new();
            if let Some(inventory) = host.inventory {
                attrs.insert("inventory_id".to_string(), Value::Int(inventory));
            }
            attrs.insert(
                "description".to_string(),
                Value::String(host.description.clone()),
            );
            attrs.insert("enabled".to_string(), Value::Bool(host.enabled));
            attrs
        }))
    }
}
