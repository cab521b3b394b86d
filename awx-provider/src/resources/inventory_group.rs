//! Inventory group resource

use std::collections::HashMap;

use awx_core::provider::{ProviderError, ProviderResult};
use awx_core::resource::{Resource, ResourceId, State, Value};
use log::{debug, info};
use serde::Serialize;

use crate::api::{Filters, Group, Payload, filters};
use crate::link::link_all;
use crate::provider::{AwxProvider, in_resource, parse_id};
use crate::reconcile::{check_create, check_delete, check_update};
use crate::schemas::inventory_group::inventory_group_schema;
use crate::translate::{AttributeReader, Reference, reference_string, to_payload, validate_attributes};
use crate::utils::normalize_json_yaml;

const KIND: &str = "InventoryGroup";

/// Validated inventory group attributes, shaped like the AWX payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryGroupSpec {
    pub name: String,
    pub description: String,
    pub inventory: Reference,
    pub variables: String,
    #[serde(skip)]
    pub child_group_ids: Vec<i64>,
}

impl InventoryGroupSpec {
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> ProviderResult<Self> {
        let attributes = validate_attributes(&inventory_group_schema(), attributes)?;
        let attrs = AttributeReader::new(&attributes);

        Ok(Self {
            name: attrs.string("name"),
            description: attrs.string("description"),
            inventory: attrs.reference("inventory_id")?,
            variables: normalize_json_yaml(&attrs.string("variables")),
            child_group_ids: attrs.id_list("child_group_ids"),
        })
    }

    pub fn payload(&self) -> ProviderResult<Payload> {
        to_payload(self)
    }

    /// Natural key: name, scoped by inventory when one is given
    fn natural_key(&self) -> Filters {
        let mut key = filters([("name", self.name.clone())]);
        if let Reference::Id(inventory) = self.inventory {
            key.insert("inventory".to_string(), inventory.to_string());
        }
        key
    }
}

/// Attribute map for a group as stored in state
pub fn inventory_group_attributes(group: &Group, children: &[Group]) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    attributes.insert("name".to_string(), Value::String(group.name.clone()));
    attributes.insert(
        "description".to_string(),
        Value::String(group.description.clone()),
    );
    attributes.insert("inventory_id".to_string(), reference_string(group.inventory));
    attributes.insert(
        "variables".to_string(),
        Value::String(normalize_json_yaml(&group.variables)),
    );
    attributes.insert(
        "child_group_ids".to_string(),
        Value::List(children.iter().map(|c| Value::Int(c.id)).collect()),
    );
    attributes
}

impl AwxProvider {
    async fn group_state(&self, id: ResourceId, group: &Group) -> ProviderResult<State> {
        let children = self
            .api()
            .list_child_groups(group.id)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        Ok(
            State::existing(id, inventory_group_attributes(group, &children))
                .with_identifier(group.id.to_string()),
        )
    }

    /// Read an inventory group by identifier
    pub(crate) async fn read_inventory_group(
        &self,
        id: ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id));
        };
        let group_id = parse_id(&id, identifier)?;

        let found = self
            .api()
            .list_groups(&filters([("id", group_id.to_string())]))
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        match found.into_iter().next() {
            Some(group) => self.group_state(id, &group).await,
            None => Ok(State::not_found(id)),
        }
    }

    /// Create an inventory group and link its child groups
    pub(crate) async fn create_inventory_group(&self, resource: Resource) -> ProviderResult<State> {
        let id = resource.id.clone();
        let spec = InventoryGroupSpec::from_attributes(&resource.attributes)
            .map_err(in_resource(&id))?;

        let existing = self
            .api()
            .list_groups(&spec.natural_key())
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        check_create(KIND, &existing).map_err(in_resource(&id))?;

        let payload = spec.payload().map_err(in_resource(&id))?;
        let created = self
            .api()
            .create_group(&payload)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        info!("{}: created inventory group {}", id, created.id);

        let api = self.api();
        link_all(
            created.id,
            "child group",
            &spec.child_group_ids,
            |child_id| api.add_child_group(created.id, child_id),
        )
        .await
        .map_err(in_resource(&id))?;

        self.read_inventory_group(id, Some(&created.id.to_string()))
            .await
    }

    /// Update an inventory group in place; child groups are linked on create only
    pub(crate) async fn update_inventory_group(
        &self,
        id: ResourceId,
        identifier: &str,
        to: Resource,
    ) -> ProviderResult<State> {
        let group_id = parse_id(&id, identifier)?;
        let spec = InventoryGroupSpec::from_attributes(&to.attributes).map_err(in_resource(&id))?;

        let found = self
            .api()
            .list_groups(&filters([("id", group_id.to_string())]))
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        check_update(KIND, group_id, found).map_err(in_resource(&id))?;

        let payload = spec.payload().map_err(in_resource(&id))?;
        self.api()
            .update_group(group_id, &payload)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        debug!("{}: updated inventory group {}", id, group_id);

        self.read_inventory_group(id, Some(identifier)).await
    }

    /// Delete an inventory group; absence is success
    pub(crate) async fn delete_inventory_group(
        &self,
        id: ResourceId,
        identifier: &str,
    ) -> ProviderResult<()> {
        let group_id = parse_id(&id, identifier)?;
        let found = self
            .api()
            .list_groups(&filters([("id", group_id.to_string())]))
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        if check_delete(found).is_none() {
            debug!("{}: inventory group {} already absent", id, group_id);
            return Ok(());
        }

        self.api()
            .delete_group(group_id)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        info!("{}: deleted inventory group {}", id, group_id);
        Ok(())
    }

    /// Import an existing inventory group by identifier
    pub(crate) async fn import_inventory_group(
        &self,
        id: ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let group_id = parse_id(&id, identifier)?;
        let group = self
            .api()
            .get_group(group_id)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        match group {
            Some(group) => self.group_state(id, &group).await,
            None => Err(
                ProviderError::not_found(format!("Inventory group {} not found", group_id))
                    .for_resource(id),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn webservers() -> HashMap<String, Value> {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("webservers".to_string()));
        attrs.insert("inventory_id".to_string(), Value::String("3".to_string()));
        attrs.insert(
            "variables".to_string(),
            Value::String("{ \"http_port\" : 80 }".to_string()),
        );
        attrs.insert(
            "child_group_ids".to_string(),
            Value::List(vec![Value::Int(7), Value::Int(8)]),
        );
        attrs
    }

    #[test]
    fn payload_omits_children_and_normalizes_variables() {
        let spec = InventoryGroupSpec::from_attributes(&webservers()).unwrap();
        assert_eq!(spec.child_group_ids, vec![7, 8]);

        let payload = spec.payload().unwrap();
        assert_eq!(
            serde_json::Value::Object(payload),
            json!({
                "name": "webservers",
                "description": "",
                "inventory": 3,
                "variables": "{\"http_port\":80}"
            })
        );
    }

    #[test]
    fn natural_key_is_scoped_by_inventory() {
        let spec = InventoryGroupSpec::from_attributes(&webservers()).unwrap();
        let key = spec.natural_key();
        assert_eq!(key.get("inventory").map(String::as_str), Some("3"));

        let mut attrs = webservers();
        attrs.insert("inventory_id".to_string(), Value::String(String::new()));
        let spec = InventoryGroupSpec::from_attributes(&attrs).unwrap();
        assert!(!spec.natural_key().contains_key("inventory"));
        assert_eq!(spec.payload().unwrap()["inventory"], json!(null));
    }

    #[test]
    fn attributes_list_children_in_order() {
        let group = Group {
            id: 10,
            name: "webservers".to_string(),
            inventory: Some(3),
            variables: "---\nhttp_port:   80\n".to_string(),
            ..Default::default()
        };
        let children = [
            Group {
                id: 7,
                ..Default::default()
            },
            Group {
                id: 8,
                ..Default::default()
            },
        ];

        let attributes = inventory_group_attributes(&group, &children);
        assert_eq!(attributes["inventory_id"], Value::String("3".to_string()));
        assert_eq!(attributes["variables"], Value::String("http_port: 80\n".to_string()));
        assert_eq!(
            attributes["child_group_ids"],
            Value::List(vec![Value::Int(7), Value::Int(8)])
        );
    }
}
