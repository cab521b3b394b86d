//! HTTP implementation of [`AwxApi`] for the AWX v2 REST API

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::models::{Group, Host, Inventory, JobTemplate, Page, Project, ProjectUpdate, SurveySpec};
use super::{ApiError, ApiResult, AwxApi, Filters, Payload};
use crate::config::ProviderConfig;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate a response body and strip control characters for logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };
    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// AWX client speaking HTTP with basic authentication
#[derive(Clone)]
pub struct HttpAwxClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl std::fmt::Debug for HttpAwxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAwxClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl HttpAwxClient {
    /// Create a client for the AWX instance at `hostname`
    pub fn new(
        hostname: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        insecure: bool,
    ) -> ApiResult<Self> {
        let mut root = hostname.trim().to_string();
        if !root.ends_with('/') {
            root.push('/');
        }
        let base_url = Url::parse(&root)
            .and_then(|u| u.join("api/v2/"))
            .map_err(|e| ApiError::Configuration(format!("invalid hostname '{}': {}", hostname, e)))?;

        let client = Client::builder()
            .user_agent(concat!("terraform-provider-awx/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            username: username.into(),
            password: password.into(),
        })
    }

    /// Create a client from provider configuration
    pub fn from_config(config: &ProviderConfig) -> ApiResult<Self> {
        Self::new(
            &config.hostname,
            config.username.clone(),
            config.password.clone(),
            config.insecure,
        )
    }

    /// Base URL of the v2 API (always ends in `/api/v2/`)
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Configuration(format!("invalid endpoint '{}': {}", path, e)))
    }

    /// Send a request and return the status and body of a successful response
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> ApiResult<(StatusCode, String)> {
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url.clone())
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            if status != StatusCode::NOT_FOUND {
                error!("AWX API error: {} - {}", status, sanitize_for_log(&text));
            }
            return Err(ApiError::Http {
                status: status.as_u16(),
                url: url.to_string(),
                body: text,
            });
        }

        Ok((status, text))
    }

    fn decode<T: DeserializeOwned>(text: &str) -> ApiResult<T> {
        serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// GET a single object; 404 maps to `None`
    async fn get_object<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<T>> {
        let url = self.endpoint(path)?;
        match self.execute(Method::GET, url, None).await {
            Ok((_, text)) => Self::decode(&text).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// GET every page of a filtered list
    async fn list<T: DeserializeOwned>(&self, path: &str, filters: &Filters) -> ApiResult<Vec<T>> {
        let mut url = self.endpoint(path)?;
        if !filters.is_empty() {
            url.query_pairs_mut().extend_pairs(filters.iter());
        }

        let mut results = Vec::new();
        loop {
            let (_, text) = self.execute(Method::GET, url, None).await?;
            let page: Page<T> = Self::decode(&text)?;
            results.extend(page.results);

            match page.next {
                Some(next) if !next.is_empty() => url = self.endpoint(&next)?,
                _ => break,
            }
        }
        Ok(results)
    }

    async fn send_object<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: &Payload,
    ) -> ApiResult<T> {
        let url = self.endpoint(path)?;
        let body = serde_json::Value::Object(payload.clone());
        let (_, text) = self.execute(method, url, Some(&body)).await?;
        Self::decode(&text)
    }

    /// POST `{"id": child}` to an association endpoint
    async fn associate(&self, path: &str, child_id: i64) -> ApiResult<()> {
        let url = self.endpoint(path)?;
        self.execute(Method::POST, url, Some(&json!({ "id": child_id })))
            .await
            .map(|_| ())
    }

    /// DELETE an object; 404 means it is already gone
    async fn delete_object(&self, path: &str) -> ApiResult<()> {
        let url = self.endpoint(path)?;
        match self.execute(Method::DELETE, url, None).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!("{} already absent", path);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl AwxApi for HttpAwxClient {
    async fn list_job_templates(&self, filters: &Filters) -> ApiResult<Vec<JobTemplate>> {
        self.list("job_templates/", filters).await
    }

    async fn get_job_template(&self, id: i64) -> ApiResult<Option<JobTemplate>> {
        self.get_object(&format!("job_templates/{}/", id)).await
    }

    async fn create_job_template(&self, payload: &Payload) -> ApiResult<JobTemplate> {
        self.send_object(Method::POST, "job_templates/", payload)
            .await
    }

    async fn update_job_template(&self, id: i64, payload: &Payload) -> ApiResult<JobTemplate> {
        self.send_object(Method::PATCH, &format!("job_templates/{}/", id), payload)
            .await
    }

    async fn delete_job_template(&self, id: i64) -> ApiResult<()> {
        self.delete_object(&format!("job_templates/{}/", id)).await
    }

    async fn add_job_template_credential(
        &self,
        template_id: i64,
        credential_id: i64,
    ) -> ApiResult<()> {
        self.associate(
            &format!("job_templates/{}/credentials/", template_id),
            credential_id,
        )
        .await
    }

    async fn get_survey_spec(&self, template_id: i64) -> ApiResult<Option<SurveySpec>> {
        self.get_object(&format!("job_templates/{}/survey_spec/", template_id))
            .await
    }

    async fn list_groups(&self, filters: &Filters) -> ApiResult<Vec<Group>> {
        self.list("groups/", filters).await
    }

    async fn get_group(&self, id: i64) -> ApiResult<Option<Group>> {
        self.get_object(&format!("groups/{}/", id)).await
    }

    async fn create_group(&self, payload: &Payload) -> ApiResult<Group> {
        self.send_object(Method::POST, "groups/", payload).await
    }

    async fn update_group(&self, id: i64, payload: &Payload) -> ApiResult<Group> {
        self.send_object(Method::PATCH, &format!("groups/{}/", id), payload)
            .await
    }

    async fn delete_group(&self, id: i64) -> ApiResult<()> {
        self.delete_object(&format!("groups/{}/", id)).await
    }

    async fn add_child_group(&self, parent_id: i64, child_id: i64) -> ApiResult<()> {
        self.associate(&format!("groups/{}/children/", parent_id), child_id)
            .await
    }

    async fn list_child_groups(&self, parent_id: i64) -> ApiResult<Vec<Group>> {
        self.list(&format!("groups/{}/children/", parent_id), &Filters::new())
            .await
    }

    async fn list_hosts(&self, filters: &Filters) -> ApiResult<Vec<Host>> {
        self.list("hosts/", filters).await
    }

    async fn list_inventories(&self, filters: &Filters) -> ApiResult<Vec<Inventory>> {
        self.list("inventories/", filters).await
    }

    async fn list_projects(&self, filters: &Filters) -> ApiResult<Vec<Project>> {
        self.list("projects/", filters).await
    }

    async fn get_project_update(&self, id: i64) -> ApiResult<Option<ProjectUpdate>> {
        self.get_object(&format!("project_updates/{}/", id)).await
    }
}
