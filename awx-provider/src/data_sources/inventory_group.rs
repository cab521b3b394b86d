//! Inventory group data source

use std::collections::HashMap;

use awx_core::provider::ProviderResult;
use awx_core::resource::{Resource, State, Value};

use super::{NameLookup, first_match, lookup_error};
use crate::provider::AwxProvider;
use crate::schemas::data_sources::inventory_group_schema;

impl AwxProvider {
    pub(crate) async fn read_inventory_group_data_source(
        &self,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let lookup = NameLookup::from_resource(&inventory_group_schema(), resource)?;
        let groups = self
            .api()
            .list_groups(&lookup.filters())
            .await
            .map_err(lookup_error(resource))?;

        Ok(first_match(resource, groups, |group| {
            let mut attrs = HashMap::new();
            if let Some(inventory) = group.inventory {
                attrs.insert("inventory_id".to_string(), Value::Int(inventory));
            }
            attrs
        }))
    }
}
