//! Wire models for the AWX v2 REST API
//!
//! Only the fields the provider reads are modelled; everything else in the
//! response is ignored. Missing fields fall back to their defaults because
//! older AWX releases omit several of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record with a numeric id and a name, as every AWX object has
pub trait Record {
    fn id(&self) -> i64;
    fn name(&self) -> &str;
}

macro_rules! impl_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Record for $ty {
                fn id(&self) -> i64 {
                    self.id
                }
                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

/// Paginated list response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobTemplate {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub job_type: String,
    pub inventory: Option<i64>,
    pub project: Option<i64>,
    pub playbook: String,
    pub credential: Option<i64>,
    pub vault_credential: Option<i64>,
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
    pub host_config_key: String,
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
    pub summary_fields: JobTemplateSummary,
    pub related: JobTemplateRelated,
}

impl JobTemplate {
    /// Ids of the extra credentials attached to this template
    pub fn extra_credential_ids(&self) -> Vec<i64> {
        self.summary_fields
            .extra_credentials
            .iter()
            .map(|c| c.id)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobTemplateSummary {
    pub extra_credentials: Vec<CredentialSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialSummary {
    pub id: i64,
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobTemplateRelated {
    pub callback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub inventory: Option<i64>,
    pub variables: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Host {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub inventory: Option<i64>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Inventory {
    pub id: i64,
    pub name: String,
    pub organization: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub scm_type: String,
    pub scm_url: String,
    pub summary_fields: ProjectSummary,
}

impl Project {
    /// The update job to wait on: the current job, else the last one
    pub fn pending_job_id(&self) -> Option<i64> {
        self.summary_fields
            .current_job
            .as_ref()
            .and_then(|j| j.id)
            .or_else(|| self.summary_fields.last_job.as_ref().and_then(|j| j.id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectSummary {
    pub current_job: Option<JobSummary>,
    pub last_job: Option<JobSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobSummary {
    pub id: Option<i64>,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectUpdate {
    pub id: i64,
    pub status: String,
    /// Completion time; `None` while the update is still running
    pub finished: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SurveySpec {
    pub name: String,
    pub description: String,
    pub spec: Vec<SurveyQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SurveyQuestion {
    pub variable: String,
    pub question_name: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub required: bool,
    pub default: serde_json::Value,
}

impl_record!(JobTemplate, Group, Host, Inventory, Project);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_template_tolerates_missing_and_null_fields() {
        let jt: JobTemplate = serde_json::from_value(json!({
            "id": 11,
            "name": "deploy",
            "job_type": "run",
            "inventory": null,
            "project": 5,
            "custom_virtualenv": null,
            "summary_fields": {
                "extra_credentials": [{"id": 3, "name": "aws", "kind": "aws"}]
            }
        }))
        .unwrap();

        assert_eq!(jt.id, 11);
        assert_eq!(jt.inventory, None);
        assert_eq!(jt.project, Some(5));
        assert_eq!(jt.forks, 0);
        assert_eq!(jt.extra_credential_ids(), vec![3]);
    }

    #[test]
    fn project_prefers_current_job() {
        let project: Project = serde_json::from_value(json!({
            "id": 5,
            "name": "playbooks",
            "summary_fields": {
                "current_job": {"id": 40, "status": "running"},
                "last_job": {"id": 39, "status": "successful"}
            }
        }))
        .unwrap();
        assert_eq!(project.pending_job_id(), Some(40));

        let project: Project = serde_json::from_value(json!({
            "id": 5,
            "name": "playbooks",
            "summary_fields": {"last_job": {"id": 39, "status": "successful"}}
        }))
        .unwrap();
        assert_eq!(project.pending_job_id(), Some(39));

        let project: Project = serde_json::from_value(json!({"id": 5, "name": "x"})).unwrap();
        assert_eq!(project.pending_job_id(), None);
    }

    #[test]
    fn project_update_finished_is_optional() {
        let running: ProjectUpdate =
            serde_json::from_value(json!({"id": 40, "status": "running", "finished": null}))
                .unwrap();
        assert!(running.finished.is_none());

        let done: ProjectUpdate = serde_json::from_value(json!({
            "id": 40,
            "status": "successful",
            "finished": "2024-03-01T10:00:00.123456Z"
        }))
        .unwrap();
        assert!(done.finished.is_some());
    }
}
