//! Job template resource
//!
//! Writes wait for the owning project's SCM update, then attach extra
//! credentials one by one after both create and update.

use std::collections::HashMap;

use awx_core::provider::{ProviderError, ProviderResult};
use awx_core::resource::{Resource, ResourceId, State, Value};
use log::{debug, info};
use serde::Serialize;

use crate::api::{JobTemplate, Payload, filters};
use crate::link::link_all;
use crate::provider::{AwxProvider, in_resource, parse_id};
use crate::reconcile::{check_create, check_delete, check_update};
use crate::schemas::job_template::job_template_schema;
use crate::translate::{AttributeReader, Reference, reference_string, to_payload, validate_attributes};

const KIND: &str = "JobTemplate";

/// Validated job template attributes, shaped like the AWX payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobTemplateSpec {
    pub name: String,
    pub description: String,
    pub job_type: String,
    pub inventory: Reference,
    pub project: i64,
    pub playbook: String,
    pub credential: Reference,
    pub vault_credential: Reference,
    pub forks: i64,
    pub limit: String,
    pub verbosity: i64,
    pub extra_vars: String,
    pub job_tags: String,
    pub force_handlers: bool,
    pub skip_tags: String,
    pub start_at_task: String,
    pub timeout: i64,
    pub use_fact_cache: bool,
    pub ask_diff_mode_on_launch: bool,
    pub ask_variables_on_launch: bool,
    pub ask_limit_on_launch: bool,
    pub ask_tags_on_launch: bool,
    pub ask_skip_tags_on_launch: bool,
    pub ask_job_type_on_launch: bool,
    pub ask_verbosity_on_launch: bool,
    pub ask_inventory_on_launch: bool,
    pub ask_credential_on_launch: bool,
    pub survey_enabled: bool,
    pub become_enabled: bool,
    pub diff_mode: bool,
    pub allow_simultaneous: bool,
    pub custom_virtualenv: Option<String>,
    #[serde(skip)]
    pub extra_credential_ids: Vec<i64>,
    /// Existing template to manage instead of creating one
    #[serde(skip)]
    pub job_id: Option<i64>,
    #[serde(skip)]
    pub allow_callbacks: bool,
}

#[derive(Serialize)]
struct JobTemplatePayload<'a> {
    #[serde(flatten)]
    spec: &'a JobTemplateSpec,
    host_config_key: &'a str,
}

impl JobTemplateSpec {
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> ProviderResult<Self> {
        let attributes = validate_attributes(&job_template_schema(), attributes)?;
        let attrs = AttributeReader::new(&attributes);

        let project = attrs.reference("project_id")?.id().ok_or_else(|| {
            ProviderError::invalid_config("Attribute 'project_id' must not be empty")
        })?;
        let custom_virtualenv = attrs.string("custom_virtualenv");

        Ok(Self {
            name: attrs.string("name"),
            description: attrs.string("description"),
            job_type: attrs.string("job_type").to_ascii_lowercase(),
            inventory: attrs.reference("inventory_id")?,
            project,
            playbook: attrs.string("playbook"),
            credential: attrs.reference("credential_id")?,
            vault_credential: attrs.reference("vault_credential_id")?,
            forks: attrs.int("forks"),
            limit: attrs.string("limit"),
            verbosity: attrs.int("verbosity"),
            extra_vars: attrs.string("extra_vars"),
            job_tags: attrs.string("job_tags"),
            force_handlers: attrs.bool("force_handlers"),
            skip_tags: attrs.string("skip_tags"),
            start_at_task: attrs.string("start_at_task"),
            timeout: attrs.int("timeout"),
            use_fact_cache: attrs.bool("use_fact_cache"),
            ask_diff_mode_on_launch: attrs.bool("ask_diff_mode_on_launch"),
            ask_variables_on_launch: attrs.bool("ask_variables_on_launch"),
            ask_limit_on_launch: attrs.bool("ask_limit_on_launch"),
            ask_tags_on_launch: attrs.bool("ask_tags_on_launch"),
            ask_skip_tags_on_launch: attrs.bool("ask_skip_tags_on_launch"),
            ask_job_type_on_launch: attrs.bool("ask_job_type_on_launch"),
            ask_verbosity_on_launch: attrs.bool("ask_verbosity_on_launch"),
            ask_inventory_on_launch: attrs.bool("ask_inventory_on_launch"),
            ask_credential_on_launch: attrs.bool("ask_credential_on_launch"),
            survey_enabled: attrs.bool("survey_enabled"),
            become_enabled: attrs.bool("become_enabled"),
            diff_mode: attrs.bool("diff_mode"),
            allow_simultaneous: attrs.bool("allow_simultaneous"),
            custom_virtualenv: (!custom_virtualenv.is_empty()).then_some(custom_virtualenv),
            extra_credential_ids: attrs.id_list("extra_credential_ids"),
            job_id: Some(attrs.int("job_id")).filter(|id| *id > 0),
            allow_callbacks: attrs.bool("allow_callbacks"),
        })
    }

    /// Build the create/update payload with the given callback key
    pub fn payload(&self, host_config_key: &str) -> ProviderResult<Payload> {
        to_payload(&JobTemplatePayload {
            spec: self,
            host_config_key,
        })
    }

    /// Callback key to send: empty unless callbacks are enabled, in which
    /// case a known key is kept and a fresh one generated otherwise.
    pub fn host_config_key(&self, known: Option<&str>) -> String {
        if !self.allow_callbacks {
            return String::new();
        }
        match known {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Attribute map for a job template as stored in state
pub fn job_template_attributes(template: &JobTemplate) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    let mut set = |key: &str, value: Value| {
        attributes.insert(key.to_string(), value);
    };

    set("job_id", Value::Int(template.id));
    set("name", template.name.clone().into());
    set("description", template.description.clone().into());
    set("job_type", template.job_type.clone().into());
    set("inventory_id", reference_string(template.inventory));
    set("project_id", reference_string(template.project));
    set("playbook", template.playbook.clone().into());
    set("credential_id", reference_string(template.credential));
    set("vault_credential_id", reference_string(template.vault_credential));
    set(
        "extra_credential_ids",
        Value::List(
            template
                .extra_credential_ids()
                .into_iter()
                .map(Value::Int)
                .collect(),
        ),
    );
    set("forks", Value::Int(template.forks));
    set("limit", template.limit.clone().into());
    set("verbosity", Value::Int(template.verbosity));
    set("extra_vars", template.extra_vars.clone().into());
    set("job_tags", template.job_tags.clone().into());
    set("force_handlers", template.force_handlers.into());
    set("skip_tags", template.skip_tags.clone().into());
    set("start_at_task", template.start_at_task.clone().into());
    set("timeout", Value::Int(template.timeout));
    set("use_fact_cache", template.use_fact_cache.into());
    set("host_config_key", template.host_config_key.clone().into());
    set("ask_diff_mode_on_launch", template.ask_diff_mode_on_launch.into());
    set("ask_variables_on_launch", template.ask_variables_on_launch.into());
    set("ask_limit_on_launch", template.ask_limit_on_launch.into());
    set("ask_tags_on_launch", template.ask_tags_on_launch.into());
    set("ask_skip_tags_on_launch", template.ask_skip_tags_on_launch.into());
    set("ask_job_type_on_launch", template.ask_job_type_on_launch.into());
    set("ask_verbosity_on_launch", template.ask_verbosity_on_launch.into());
    set("ask_inventory_on_launch", template.ask_inventory_on_launch.into());
    set("ask_credential_on_launch", template.ask_credential_on_launch.into());
    set("survey_enabled", template.survey_enabled.into());
    set("become_enabled", template.become_enabled.into());
    set("diff_mode", template.diff_mode.into());
    set("allow_simultaneous", template.allow_simultaneous.into());
    set(
        "custom_virtualenv",
        template.custom_virtualenv.clone().unwrap_or_default().into(),
    );
    set("allow_callbacks", (!template.host_config_key.is_empty()).into());

    attributes
}

fn template_state(id: ResourceId, template: &JobTemplate) -> State {
    State::existing(id, job_template_attributes(template)).with_identifier(template.id.to_string())
}

impl AwxProvider {
    /// Read a job template by identifier
    pub(crate) async fn read_job_template(
        &self,
        id: ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id));
        };
        let template_id = parse_id(&id, identifier)?;

        let found = self
            .api()
            .list_job_templates(&filters([("id", template_id.to_string())]))
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        match found.into_iter().next() {
            Some(template) => Ok(template_state(id, &template)),
            None => Ok(State::not_found(id)),
        }
    }

    /// Create a job template, or adopt the one named by `job_id`
    pub(crate) async fn create_job_template(&self, resource: Resource) -> ProviderResult<State> {
        let id = resource.id.clone();
        let spec = JobTemplateSpec::from_attributes(&resource.attributes)
            .map_err(in_resource(&id))?;

        if let Some(job_id) = spec.job_id {
            info!("{}: managing existing job template {}", id, job_id);
            return self
                .write_job_template(id.clone(), job_id, &spec, None)
                .await
                .map_err(in_resource(&id));
        }

        let existing = self
            .api()
            .list_job_templates(&filters([
                ("name", spec.name.clone()),
                ("project", spec.project.to_string()),
            ]))
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        check_create(KIND, &existing).map_err(in_resource(&id))?;

        self.wait_for_project(spec.project)
            .await
            .map_err(in_resource(&id))?;

        let payload = spec
            .payload(&spec.host_config_key(None))
            .map_err(in_resource(&id))?;
        let created = self
            .api()
            .create_job_template(&payload)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        info!("{}: created job template {}", id, created.id);

        self.link_credentials(created.id, &spec)
            .await
            .map_err(in_resource(&id))?;

        self.read_job_template(id, Some(&created.id.to_string()))
            .await
    }

    /// Update a job template in place
    pub(crate) async fn update_job_template(
        &self,
        id: ResourceId,
        identifier: &str,
        from: &State,
        to: Resource,
    ) -> ProviderResult<State> {
        let template_id = parse_id(&id, identifier)?;
        let spec =
            JobTemplateSpec::from_attributes(&to.attributes).map_err(in_resource(&id))?;
        let known_key = from.attributes.get("host_config_key").and_then(Value::as_str);

        self.write_job_template(id.clone(), template_id, &spec, known_key)
            .await
            .map_err(in_resource(&id))
    }

    async fn write_job_template(
        &self,
        id: ResourceId,
        template_id: i64,
        spec: &JobTemplateSpec,
        known_key: Option<&str>,
    ) -> ProviderResult<State> {
        let found = self
            .api()
            .list_job_templates(&filters([("id", template_id.to_string())]))
            .await?;
        let current = check_update(KIND, template_id, found)?;

        self.wait_for_project(spec.project).await?;

        let known_key = known_key
            .filter(|k| !k.is_empty())
            .or_else(|| Some(current.host_config_key.as_str()));
        let payload = spec.payload(&spec.host_config_key(known_key))?;
        self.api()
            .update_job_template(template_id, &payload)
            .await?;
        debug!("{}: updated job template {}", id, template_id);

        self.link_credentials(template_id, spec).await?;

        self.read_job_template(id, Some(&template_id.to_string()))
            .await
    }

    async fn link_credentials(&self, template_id: i64, spec: &JobTemplateSpec) -> ProviderResult<()> {
        let api = self.api();
        link_all(
            template_id,
            "credential",
            &spec.extra_credential_ids,
            |credential_id| api.add_job_template_credential(template_id, credential_id),
        )
        .await
        .map(|_| ())
    }

    /// Delete a job template; absence is success
    pub(crate) async fn delete_job_template(
        &self,
        id: ResourceId,
        identifier: &str,
    ) -> ProviderResult<()> {
        let template_id = parse_id(&id, identifier)?;
        let found = self
            .api()
            .list_job_templates(&filters([("id", template_id.to_string())]))
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        if check_delete(found).is_none() {
            debug!("{}: job template {} already absent", id, template_id);
            return Ok(());
        }

        self.api()
            .delete_job_template(template_id)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        info!("{}: deleted job template {}", id, template_id);
        Ok(())
    }

    /// Import an existing job template by identifier
    pub(crate) async fn import_job_template(
        &self,
        id: ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let template_id = parse_id(&id, identifier)?;
        match self
            .api()
            .get_job_template(template_id)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?
        {
            Some(template) => Ok(template_state(id, &template)),
            None => Err(ProviderError::not_found(format!(
                "Job template {} not found",
                template_id
            ))
            .for_resource(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn deploy() -> HashMap<String, Value> {
        attrs(&[
            ("name", "deploy".into()),
            ("job_type", "Run".into()),
            ("project_id", "5".into()),
            ("inventory_id", "12".into()),
        ])
    }

    #[test]
    fn spec_applies_defaults_and_normalizes_job_type() {
        let spec = JobTemplateSpec::from_attributes(&deploy()).unwrap();
        assert_eq!(spec.job_type, "run");
        assert_eq!(spec.inventory, Reference::Id(12));
        assert_eq!(spec.credential, Reference::Cleared);
        assert_eq!(spec.forks, 0);
        assert_eq!(spec.custom_virtualenv, None);
        assert_eq!(spec.job_id, None);
    }

    #[test]
    fn payload_carries_explicit_nulls() {
        let spec = JobTemplateSpec::from_attributes(&deploy()).unwrap();
        let payload = spec.payload("").unwrap();

        assert_eq!(payload["name"], json!("deploy"));
        assert_eq!(payload["project"], json!(5));
        assert_eq!(payload["inventory"], json!(12));
        assert_eq!(payload["job_type"], json!("run"));
        assert_eq!(payload["credential"], json!(null));
        assert_eq!(payload["vault_credential"], json!(null));
        assert_eq!(payload["custom_virtualenv"], json!(null));
        assert_eq!(payload["host_config_key"], json!(""));
        assert!(!payload.contains_key("extra_credential_ids"));
        assert!(!payload.contains_key("job_id"));
        assert!(!payload.contains_key("allow_callbacks"));
    }

    #[test]
    fn empty_project_is_rejected() {
        let mut a = deploy();
        a.insert("project_id".to_string(), "".into());
        let err = JobTemplateSpec::from_attributes(&a).unwrap_err();
        assert!(err.message.contains("project_id"));
    }

    #[test]
    fn callback_key_is_kept_or_generated() {
        let mut a = deploy();
        a.insert("allow_callbacks".to_string(), true.into());
        let spec = JobTemplateSpec::from_attributes(&a).unwrap();

        assert_eq!(spec.host_config_key(Some("kept")), "kept");
        let fresh = spec.host_config_key(None);
        assert!(uuid::Uuid::parse_str(&fresh).is_ok());
        assert_ne!(fresh, spec.host_config_key(Some("")));

        let spec = JobTemplateSpec::from_attributes(&deploy()).unwrap();
        assert_eq!(spec.host_config_key(Some("kept")), "");
    }

    #[test]
    fn attributes_mirror_the_remote_record() {
        let template: JobTemplate = serde_json::from_value(json!({
            "id": 11,
            "name": "deploy",
            "job_type": "run",
            "project": 5,
            "inventory": null,
            "host_config_key": "abc",
            "summary_fields": {"extra_credentials": [{"id": 3}, {"id": 4}]}
        }))
        .unwrap();

        let attributes = job_template_attributes(&template);
        assert_eq!(attributes["job_id"], Value::Int(11));
        assert_eq!(attributes["project_id"], Value::String("5".to_string()));
        assert_eq!(attributes["inventory_id"], Value::String(String::new()));
        assert_eq!(attributes["allow_callbacks"], Value::Bool(true));
        assert_eq!(
            attributes["extra_credential_ids"],
            Value::List(vec![Value::Int(3), Value::Int(4)])
        );
    }
}
