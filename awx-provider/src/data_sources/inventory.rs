//! Inventory data source

use std::collections::HashMap;

use awx_core::provider::ProviderResult;
use awx_core::resource::{Resource, State, Value};

use super::{NameLookup, first_match, lookup_error};
use crate::provider::AwxProvider;
use crate::schemas::data_sources::inventory_schema;

impl AwxProvider {
    pub(crate) async fn read_inventory_data_source(
        &self,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let lookup = NameLookup::from_resource(&inventory_schema(), resource)?;
        let inventories = self
            .api()
            .list_inventories(&lookup.filters())
            .await
            .map_err(lookup_error(resource))?;

        Ok(first_match(resource, inventories, |inventory| {
            inventory
                .organization
                .map(|org| ("organization_id".to_string(), Value::Int(org)))
                .into_iter()
                .collect::<HashMap<_, _>>()
        }))
    }
}
