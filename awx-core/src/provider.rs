//! Provider - Trait abstracting resource operations
//!
//! A Provider defines operations for a specific remote system (AWX here).
//! It is responsible for converting resource declarations into API calls.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Classification of provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Create attempted against an existing natural-key match
    Duplicate,
    /// No remote match for an identifier or natural key
    NotFound,
    /// Transport, HTTP or decoding failure reported by the API client
    Api,
    /// The primary record was written but a follow-up link call failed
    PartialLink,
    /// A bounded wait ran out of time
    Timeout,
    /// A wait was cancelled by the caller
    Cancelled,
    /// Attributes failed validation before any remote call
    InvalidConfig,
    /// The operation is not supported for this resource type
    Unsupported,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::NotFound => "not found",
            ErrorKind::Api => "api",
            ErrorKind::PartialLink => "partial link",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::InvalidConfig => "invalid configuration",
            ErrorKind::Unsupported => "unsupported",
        };
        f.write_str(s)
    }
}

/// Outcome of a sequence of many-to-many link calls
///
/// Links are not transactional: ids in `linked` stay linked when a later
/// call fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Identifier of the record the links hang off
    pub parent: String,
    /// Relation name (e.g., "child group", "credential")
    pub relation: String,
    /// Ids linked successfully, in call order
    pub linked: Vec<i64>,
    /// The id whose link call failed, if any
    pub failed: Option<i64>,
    /// Ids never attempted because of the failure
    pub skipped: Vec<i64>,
}

impl LinkReport {
    pub fn new(parent: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            relation: relation.into(),
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
    pub resource_id: Option<ResourceId>,
    /// Remote identifier of a record that exists despite the failure
    pub identifier: Option<String>,
    pub link_report: Option<LinkReport>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(ref cause) = self.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    /// Create an API-kind error
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Api, message)
    }

    pub fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            resource_id: None,
            identifier: None,
            link_report: None,
            cause: None,
        }
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Duplicate, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::NotFound, message)
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::InvalidConfig, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Timeout, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Cancelled, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Unsupported, message)
    }

    /// Partial-link failure; the report names the failing reference
    pub fn partial_link(report: LinkReport) -> Self {
        let failed = report
            .failed
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string());
        let message = format!(
            "Failed to add {} {} to {} (linked: {:?}, skipped: {:?})",
            report.relation, failed, report.parent, report.linked, report.skipped
        );
        let mut err = Self::with_kind(ErrorKind::PartialLink, message);
        err.identifier = Some(report.parent.clone());
        err.link_report = Some(report);
        err
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Whether a type is a managed resource or a read-only data source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Resource,
    DataSource,
}

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "job_template")
    fn name(&self) -> &'static str;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Resource
    }

    /// Whether existing remote records can be imported by identifier
    fn importable(&self) -> bool {
        false
    }

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema;
}

/// Main Provider trait
///
/// All operations are async and involve side effects.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "awx")
    fn name(&self) -> &'static str;

    /// List of resource and data source types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Get the current state of a resource
    ///
    /// Returns `State::not_found()` if the resource does not exist.
    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the remote ID
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource; deleting an absent resource succeeds
    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>>;

    /// Import an existing remote record by identifier
    fn import(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let _ = identifier;
        Box::pin(async move {
            Err(ProviderError::unsupported("Import is not supported").for_resource(id))
        })
    }

    /// Read a data source
    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(id, identifier)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(id, identifier, from, to)
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id, identifier)
    }

    fn import(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).import(id, identifier)
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read_data_source(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mock Provider for testing
    struct MockProvider;

    impl Provider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
            vec![]
        }

        fn read(
            &self,
            id: &ResourceId,
            _identifier: Option<&str>,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            let attrs = resource.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs).with_identifier("42")) })
        }

        fn update(
            &self,
            id: &ResourceId,
            _identifier: &str,
            _from: &State,
            to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            let attrs = to.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs)) })
        }

        fn delete(&self, _id: &ResourceId, _identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }
    }

    #[tokio::test]
    async fn mock_provider_read_returns_not_found() {
        let provider = MockProvider;
        let id = ResourceId::new("test", "example");
        let state = provider.read(&id, None).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn mock_provider_create_returns_existing() {
        let provider = MockProvider;
        let resource = Resource::new("test", "example");
        let state = provider.create(&resource).await.unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier, Some("42".to_string()));
    }

    #[tokio::test]
    async fn import_is_unsupported_by_default() {
        let provider: Box<dyn Provider> = Box::new(MockProvider);
        let id = ResourceId::new("test", "example");
        let err = provider.import(&id, "1").await.unwrap_err();
        assert!(err.is(ErrorKind::Unsupported));
        assert_eq!(err.to_string(), "[test.example] Import is not supported");
    }

    #[test]
    fn partial_link_error_names_failed_reference() {
        let report = LinkReport {
            parent: "10".to_string(),
            relation: "child group".to_string(),
            linked: vec![7],
            failed: Some(8),
            skipped: vec![],
        };
        let err = ProviderError::partial_link(report.clone());
        assert!(err.is(ErrorKind::PartialLink));
        assert_eq!(err.identifier.as_deref(), Some("10"));
        assert_eq!(err.link_report, Some(report));
        assert!(err.message.contains("child group 8"));
    }
}
