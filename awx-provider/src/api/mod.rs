//! AWX API client abstraction
//!
//! The provider never talks HTTP directly; it goes through [`AwxApi`], which
//! is implemented by [`HttpAwxClient`] for a real AWX and by [`InMemoryAwx`]
//! for tests.

pub mod http;
pub mod memory;
pub mod models;

use std::collections::BTreeMap;

use async_trait::async_trait;
use awx_core::provider::ProviderError;
use thiserror::Error;

pub use http::HttpAwxClient;
pub use memory::InMemoryAwx;
pub use models::{
    Group, Host, Inventory, JobTemplate, Page, Project, ProjectUpdate, Record, SurveySpec,
};

/// List filters: field name to string value (e.g. `name`, `inventory`)
pub type Filters = BTreeMap<String, String>;

/// Mutation payload sent as a JSON object
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Build a filter map from string pairs
pub fn filters<const N: usize>(pairs: [(&str, String); N]) -> Filters {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Errors reported by an API client
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// The request never produced a response
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The client could not be constructed
    #[error("Invalid client configuration: {0}")]
    Configuration(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Http { status: 404, .. })
    }
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        ProviderError::new("AWX API request failed").with_cause(err)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Operations the provider needs from AWX, per object kind
#[async_trait]
pub trait AwxApi: Send + Sync {
    // Job templates
    async fn list_job_templates(&self, filters: &Filters) -> ApiResult<Vec<JobTemplate>>;
    async fn get_job_template(&self, id: i64) -> ApiResult<Option<JobTemplate>>;
    async fn create_job_template(&self, payload: &Payload) -> ApiResult<JobTemplate>;
    async fn update_job_template(&self, id: i64, payload: &Payload) -> ApiResult<JobTemplate>;
    async fn delete_job_template(&self, id: i64) -> ApiResult<()>;
    async fn add_job_template_credential(
        &self,
        template_id: i64,
        credential_id: i64,
    ) -> ApiResult<()>;
    async fn get_survey_spec(&self, template_id: i64) -> ApiResult<Option<SurveySpec>>;

    // Inventory groups
    async fn list_groups(&self, filters: &Filters) -> ApiResult<Vec<Group>>;
    async fn get_group(&self, id: i64) -> ApiResult<Option<Group>>;
    async fn create_group(&self, payload: &Payload) -> ApiResult<Group>;
    async fn update_group(&self, id: i64, payload: &Payload) -> ApiResult<Group>;
    async fn delete_group(&self, id: i64) -> ApiResult<()>;
    async fn add_child_group(&self, parent_id: i64, child_id: i64) -> ApiResult<()>;
    async fn list_child_groups(&self, parent_id: i64) -> ApiResult<Vec<Group>>;

    // Lookups
    async fn list_hosts(&self, filters: &Filters) -> ApiResult<Vec<Host>>;
    async fn list_inventories(&self, filters: &Filters) -> ApiResult<Vec<Inventory>>;
    async fn list_projects(&self, filters: &Filters) -> ApiResult<Vec<Project>>;
    async fn get_project_update(&self, id: i64) -> ApiResult<Option<ProjectUpdate>>;
}
