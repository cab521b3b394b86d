//! JSON manifest: provider block, managed resources and data sources
//!
//! ```json
//! {
//!   "provider": { "hostname": "https://awx.example.com" },
//!   "resources": [
//!     { "type": "inventory_group", "name": "web", "attributes": { "name": "webservers" } }
//!   ],
//!   "data": [
//!     { "type": "project", "name": "playbooks", "attributes": { "name": "playbooks" } }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use awx_core::provider::ResourceKind;
use awx_core::resource::{Resource, Value};
use awx_provider::resources::find_resource_type;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub resources: Vec<ManifestEntry>,
    #[serde(default)]
    pub data: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ManifestEntry {
    fn to_resource(&self, read_only: bool) -> Resource {
        let mut resource =
            Resource::new(self.resource_type.clone(), self.name.clone()).with_read_only(read_only);
        for (key, value) in &self.attributes {
            // null means "not set"
            if let Some(value) = Value::from_json(value) {
                resource.attributes.insert(key.clone(), value);
            }
        }
        resource
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let manifest: Manifest =
            serde_json::from_str(content).map_err(|e| format!("Parse error: {}", e))?;
        manifest.check_entries()?;
        Ok(manifest)
    }

    /// Reject unknown types and duplicate `type.name` pairs
    fn check_entries(&self) -> Result<(), String> {
        let mut errors = Vec::new();
        for (entries, kind, label) in [
            (&self.resources, ResourceKind::Resource, "resource"),
            (&self.data, ResourceKind::DataSource, "data source"),
        ] {
            let mut seen = HashSet::new();
            for entry in entries {
                if find_resource_type(&entry.resource_type, kind).is_none() {
                    errors.push(format!(
                        "{}.{}: unknown {} type '{}'",
                        entry.resource_type, entry.name, label, entry.resource_type
                    ));
                }
                if !seen.insert((&entry.resource_type, &entry.name)) {
                    errors.push(format!(
                        "{}.{}: declared more than once",
                        entry.resource_type, entry.name
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }

    /// Provider block as attribute values
    pub fn provider_attributes(&self) -> HashMap<String, Value> {
        self.provider
            .iter()
            .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
            .collect()
    }

    /// Managed resources, in declaration order
    pub fn resources(&self) -> Vec<Resource> {
        self.resources.iter().map(|e| e.to_resource(false)).collect()
    }

    pub fn data_sources(&self) -> Vec<Resource> {
        self.data.iter().map(|e| e.to_resource(true)).collect()
    }
}
