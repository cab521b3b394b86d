//! Data sources: read-only lookups by name
//!
//! Each lookup lists records filtered by `name` and takes the first match.
//! No match yields an absent state rather than an error.

pub mod host;
pub mod inventory;
pub mod inventory_group;
pub mod job_template;
pub mod project;

use std::collections::HashMap;

use awx_core::provider::{ProviderError, ProviderResult};
use awx_core::resource::{Resource, State, Value};
use awx_core::schema::ResourceSchema;

use crate::api::{Filters, Record, filters};
use crate::translate::{AttributeReader, validate_attributes};

/// Lookup key shared by all data sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameLookup {
    pub name: String,
    /// Optional inventory scope (inventory groups only)
    pub inventory_id: Option<i64>,
}

impl NameLookup {
    pub fn from_resource(schema: &ResourceSchema, resource: &Resource) -> ProviderResult<Self> {
        let attributes = validate_attributes(schema, &resource.attributes)
            .map_err(|e| e.for_resource(resource.id.clone()))?;
        let attrs = AttributeReader::new(&attributes);
        Ok(Self {
            name: attrs.string("name"),
            inventory_id: Some(attrs.int("inventory_id")).filter(|id| *id > 0),
        })
    }

    pub fn filters(&self) -> Filters {
        let mut f = filters([("name", self.name.clone())]);
        if let Some(inventory) = self.inventory_id {
            f.insert("inventory".to_string(), inventory.to_string());
        }
        f
    }
}

/// Build the state for the first matching record, or an absent state
fn first_match<R: Record>(
    resource: &Resource,
    records: Vec<R>,
    attributes: impl FnOnce(&R) -> HashMap<String, Value>,
) -> State {
    match records.into_iter().next() {
        Some(record) => {
            let mut attrs = attributes(&record);
            attrs.insert("id".to_string(), Value::Int(record.id()));
            attrs.insert("name".to_string(), Value::String(record.name().to_string()));
            State::existing(resource.id.clone(), attrs).with_identifier(record.id().to_string())
        }
        None => State::not_found(resource.id.clone()),
    }
}

fn lookup_error(resource: &Resource) -> impl Fn(crate::api::ApiError) -> ProviderError + '_ {
    move |e| ProviderError::from(e).for_resource(resource.id.clone())
}
