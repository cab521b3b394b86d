//! Project data source

use std::collections::HashMap;

use awx_core::provider::ProviderResult;
use awx_core::resource::{Resource, State, Value};

use super::{NameLookup, first_match, lookup_error};
use crate::provider::AwxProvider;
use crate::schemas::data_sources::project_schema;

impl AwxProvider {
    pub(crate) async fn read_project_data_source(
        &self,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let lookup = NameLookup::from_resource(&project_schema(), resource)?;
        let projects = self
            .api()
            .list_projects(&lookup.filters())
            .await
            .map_err(lookup_error(resource))?;

        Ok(first_match(resource, projects, |project| {
            HashMap::from([
                ("scm_type".to_string(), Value::String(project.scm_type.clone())),
                ("scm_url".to_string(), Value::String(project.scm_url.clone())),
            ])
        }))
    }
}
