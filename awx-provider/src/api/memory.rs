//! In-memory implementation of [`AwxApi`]
//!
//! Keeps AWX objects in process memory, records every call, and lets tests
//! script project-update completion and inject link failures.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::models::{
    CredentialSummary, Group, Host, Inventory, JobSummary, JobTemplate, Project, ProjectUpdate,
    SurveySpec,
};
use super::{ApiError, ApiResult, AwxApi, Filters, Payload};

#[derive(Default)]
struct Inner {
    next_id: i64,
    job_templates: BTreeMap<i64, JobTemplate>,
    groups: BTreeMap<i64, Group>,
    children: BTreeMap<i64, Vec<i64>>,
    hosts: Vec<Host>,
    inventories: Vec<Inventory>,
    projects: BTreeMap<i64, Project>,
    project_updates: HashMap<i64, VecDeque<ProjectUpdate>>,
    survey_specs: HashMap<i64, SurveySpec>,
    failing_links: HashSet<i64>,
    calls: Vec<String>,
    payloads: Vec<Payload>,
}

impl Inner {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, call: String) {
        self.calls.push(call);
    }
}

/// AWX fake backed by process memory
pub struct InMemoryAwx {
    inner: Mutex<Inner>,
}

impl Default for InMemoryAwx {
    fn default() -> Self {
        Self::new()
    }
}

fn http_error(status: u16, url: impl Into<String>, body: impl Into<String>) -> ApiError {
    ApiError::Http {
        status,
        url: url.into(),
        body: body.into(),
    }
}

fn matches(filters: &Filters, fields: &[(&str, Option<String>)]) -> bool {
    filters.iter().all(|(key, expected)| {
        fields
            .iter()
            .find(|(name, _)| *name == key.as_str())
            .is_some_and(|(_, actual)| actual.as_deref().unwrap_or("") == expected.as_str())
    })
}

/// Apply a payload on top of an existing object, the way a PATCH does
fn merge<T: Serialize + DeserializeOwned>(existing: &T, payload: &Payload) -> ApiResult<T> {
    let mut value = serde_json::to_value(existing).map_err(|e| ApiError::Decode(e.to_string()))?;
    if let serde_json::Value::Object(ref mut map) = value {
        for (k, v) in payload {
            map.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn from_payload<T: DeserializeOwned>(payload: &Payload) -> ApiResult<T> {
    serde_json::from_value(serde_json::Value::Object(payload.clone()))
        .map_err(|e| http_error(400, "payload", e.to_string()))
}

impl InMemoryAwx {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 100,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every call made so far, e.g. `create_group` or `add_child_group(101, 7)`
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of calls whose name starts with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Payloads of create and update calls, in order
    pub fn payloads(&self) -> Vec<Payload> {
        self.lock().payloads.clone()
    }

    pub fn insert_job_template(&self, template: JobTemplate) {
        self.lock().job_templates.insert(template.id, template);
    }

    pub fn insert_group(&self, group: Group) {
        self.lock().groups.insert(group.id, group);
    }

    pub fn insert_host(&self, host: Host) {
        self.lock().hosts.push(host);
    }

    pub fn insert_inventory(&self, inventory: Inventory) {
        self.lock().inventories.push(inventory);
    }

    pub fn insert_project(&self, project: Project) {
        self.lock().projects.insert(project.id, project);
    }

    pub fn set_survey_spec(&self, template_id: i64, spec: SurveySpec) {
        self.lock().survey_specs.insert(template_id, spec);
    }

    /// Give `project_id` a current update job `job_id` whose polls return
    /// the given `finished` values in order; the last value repeats.
    pub fn script_project_update(
        &self,
        project_id: i64,
        job_id: i64,
        finished: Vec<Option<DateTime<Utc>>>,
    ) {
        let mut inner = self.lock();
        let project = inner.projects.entry(project_id).or_insert_with(|| Project {
            id: project_id,
            name: format!("project-{}", project_id),
            ..Default::default()
        });
        project.summary_fields.current_job = Some(JobSummary {
            id: Some(job_id),
            status: "running".to_string(),
        });
        let updates = finished
            .into_iter()
            .map(|finished| ProjectUpdate {
                id: job_id,
                status: if finished.is_some() { "successful" } else { "running" }.to_string(),
                finished,
            })
            .collect();
        inner.project_updates.insert(job_id, updates);
    }

    /// Make link calls for `child_id` (child group or credential) fail
    pub fn fail_link(&self, child_id: i64) {
        self.lock().failing_links.insert(child_id);
    }

    pub fn clear_link_failures(&self) {
        self.lock().failing_links.clear();
    }

    pub fn job_template(&self, id: i64) -> Option<JobTemplate> {
        self.lock().job_templates.get(&id).cloned()
    }

    pub fn group(&self, id: i64) -> Option<Group> {
        self.lock().groups.get(&id).cloned()
    }

    pub fn child_ids(&self, parent_id: i64) -> Vec<i64> {
        self.lock()
            .children
            .get(&parent_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl AwxApi for InMemoryAwx {
    async fn list_job_templates(&self, filters: &Filters) -> ApiResult<Vec<JobTemplate>> {
        let mut inner = self.lock();
        inner.record(format!("list_job_templates({:?})", filters));
        Ok(inner
            .job_templates
            .values()
            .filter(|t| {
                matches(
                    filters,
                    &[
                        ("id", Some(t.id.to_string())),
                        ("name", Some(t.name.clone())),
                        ("project", t.project.map(|p| p.to_string())),
                        ("inventory", t.inventory.map(|i| i.to_string())),
                    ],
                )
            })
            .cloned()
            .collect())
    }

    async fn get_job_template(&self, id: i64) -> ApiResult<Option<JobTemplate>> {
        let mut inner = self.lock();
        inner.record(format!("get_job_template({})", id));
        Ok(inner.job_templates.get(&id).cloned())
    }

    async fn create_job_template(&self, payload: &Payload) -> ApiResult<JobTemplate> {
        let mut inner = self.lock();
        inner.record("create_job_template".to_string());
        inner.payloads.push(payload.clone());
        let mut template: JobTemplate = from_payload(payload)?;
        template.id = inner.allocate_id();
        inner.job_templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn update_job_template(&self, id: i64, payload: &Payload) -> ApiResult<JobTemplate> {
        let mut inner = self.lock();
        inner.record(format!("update_job_template({})", id));
        inner.payloads.push(payload.clone());
        let existing = inner
            .job_templates
            .get(&id)
            .ok_or_else(|| http_error(404, format!("job_templates/{}/", id), "Not found."))?;
        let mut updated: JobTemplate = merge(existing, payload)?;
        updated.id = id;
        inner.job_templates.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_job_template(&self, id: i64) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.record(format!("delete_job_template({})", id));
        inner.job_templates.remove(&id);
        Ok(())
    }

    async fn add_job_template_credential(
        &self,
        template_id: i64,
        credential_id: i64,
    ) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.record(format!(
            "add_job_template_credential({}, {})",
            template_id, credential_id
        ));
        let url = format!("job_templates/{}/credentials/", template_id);
        if inner.failing_links.contains(&credential_id) {
            return Err(http_error(400, url, "Credential cannot be attached."));
        }
        let template = inner
            .job_templates
            .get_mut(&template_id)
            .ok_or_else(|| http_error(404, url, "Not found."))?;
        let creds = &mut template.summary_fields.extra_credentials;
        if !creds.iter().any(|c| c.id == credential_id) {
            creds.push(CredentialSummary {
                id: credential_id,
                name: format!("credential-{}", credential_id),
                kind: "cloud".to_string(),
            });
        }
        Ok(())
    }

    async fn get_survey_spec(&self, template_id: i64) -> ApiResult<Option<SurveySpec>> {
        let mut inner = self.lock();
        inner.record(format!("get_survey_spec({})", template_id));
        Ok(inner.survey_specs.get(&template_id).cloned())
    }

    async fn list_groups(&self, filters: &Filters) -> ApiResult<Vec<Group>> {
        let mut inner = self.lock();
        inner.record(format!("list_groups({:?})", filters));
        Ok(inner
            .groups
            .values()
            .filter(|g| {
                matches(
                    filters,
                    &[
                        ("id", Some(g.id.to_string())),
                        ("name", Some(g.name.clone())),
                        ("inventory", g.inventory.map(|i| i.to_string())),
                    ],
                )
            })
            .cloned()
            .collect())
    }

    async fn get_group(&self, id: i64) -> ApiResult<Option<Group>> {
        let mut inner = self.lock();
        inner.record(format!("get_group({})", id));
        Ok(inner.groups.get(&id).cloned())
    }

    async fn create_group(&self, payload: &Payload) -> ApiResult<Group> {
        let mut inner = self.lock();
        inner.record("create_group".to_string());
        inner.payloads.push(payload.clone());
        let mut group: Group = from_payload(payload)?;
        group.id = inner.allocate_id();
        inner.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update_group(&self, id: i64, payload: &Payload) -> ApiResult<Group> {
        let mut inner = self.lock();
        inner.record(format!("update_group({})", id));
        inner.payloads.push(payload.clone());
        let existing = inner
            .groups
            .get(&id)
            .ok_or_else(|| http_error(404, format!("groups/{}/", id), "Not found."))?;
        let mut updated: Group = merge(existing, payload)?;
        updated.id = id;
        inner.groups.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_group(&self, id: i64) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.record(format!("delete_group({})", id));
        inner.groups.remove(&id);
        inner.children.remove(&id);
        for children in inner.children.values_mut() {
            children.retain(|c| *c != id);
        }
        Ok(())
    }

    async fn add_child_group(&self, parent_id: i64, child_id: i64) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.record(format!("add_child_group({}, {})", parent_id, child_id));
        let url = format!("groups/{}/children/", parent_id);
        if !inner.groups.contains_key(&parent_id) {
            return Err(http_error(404, url, "Not found."));
        }
        if inner.failing_links.contains(&child_id) || !inner.groups.contains_key(&child_id) {
            return Err(http_error(400, url, "Child group cannot be added."));
        }
        let children = inner.children.entry(parent_id).or_default();
        if !children.contains(&child_id) {
            children.push(child_id);
        }
        Ok(())
    }

    async fn list_child_groups(&self, parent_id: i64) -> ApiResult<Vec<Group>> {
        let mut inner = self.lock();
        inner.record(format!("list_child_groups({})", parent_id));
        let ids = inner.children.get(&parent_id).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| inner.groups.get(id).cloned())
            .collect())
    }

    async fn list_hosts(&self, filters: &Filters) -> ApiResult<Vec<Host>> {
        let mut inner = self.lock();
        inner.record(format!("list_hosts({:?})", filters));
        Ok(inner
            .hosts
            .iter()
            .filter(|h| {
                matches(
                    filters,
                    &[
                        ("id", Some(h.id.to_string())),
                        ("name", Some(h.name.clone())),
                        ("inventory", h.inventory.map(|i| i.to_string())),
                    ],
                )
            })
            .cloned()
            .collect())
    }

    async fn list_inventories(&self, filters: &Filters) -> ApiResult<Vec<Inventory>> {
        let mut inner = self.lock();
        inner.record(format!("list_inventories({:?})", filters));
        Ok(inner
            .inventories
            .iter()
            .filter(|i| {
                matches(
                    filters,
                    &[
                        ("id", Some(i.id.to_string())),
                        ("name", Some(i.name.clone())),
                    ],
                )
            })
            .cloned()
            .collect())
    }

    async fn list_projects(&self, filters: &Filters) -> ApiResult<Vec<Project>> {
        let mut inner = self.lock();
        inner.record(format!("list_projects({:?})", filters));
        Ok(inner
            .projects
            .values()
            .filter(|p| {
                matches(
                    filters,
                    &[
                        ("id", Some(p.id.to_string())),
                        ("name", Some(p.name.clone())),
                    ],
                )
            })
            .cloned()
            .collect())
    }

    async fn get_project_update(&self, id: i64) -> ApiResult<Option<ProjectUpdate>> {
        let mut inner = self.lock();
        inner.record(format!("get_project_update({})", id));
        let Some(queue) = inner.project_updates.get_mut(&id) else {
            return Ok(None);
        };
        let update = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(update)
    }
}
