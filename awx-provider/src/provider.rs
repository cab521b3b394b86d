//! AWX Provider implementation
//!
//! [`AwxProvider`] owns an injected [`AwxApi`] client. Per-kind handlers are
//! implemented as methods on it in `resources` and `data_sources`.

use std::sync::Arc;

use awx_core::provider::{ProviderError, ProviderResult};
use awx_core::resource::ResourceId;
use log::info;
use tokio::sync::watch;

use crate::api::{AwxApi, HttpAwxClient};
use crate::config::ProviderConfig;
use crate::utils::parse_identifier;
use crate::wait::{WaitOptions, wait_for_project_sync};

/// AWX Provider
pub struct AwxProvider {
    api: Arc<dyn AwxApi>,
    wait: WaitOptions,
    cancel: Option<watch::Receiver<bool>>,
}

impl AwxProvider {
    /// Create a provider around an API client
    pub fn new(api: Arc<dyn AwxApi>) -> Self {
        Self {
            api,
            wait: WaitOptions::default(),
            cancel: None,
        }
    }

    /// Create a provider talking HTTP to the configured AWX instance
    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        let client = HttpAwxClient::from_config(config).map_err(|e| {
            ProviderError::invalid_config("Failed to configure AWX client").with_cause(e)
        })?;
        info!("Using AWX API at {}", client.base_url());
        Ok(Self::new(Arc::new(client)).with_wait_options(config.wait))
    }

    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Abort project-update waits once `cancel` turns true
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn api(&self) -> &dyn AwxApi {
        self.api.as_ref()
    }

    pub fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    /// Wait for the project's pending SCM update before writing a job template
    pub(crate) async fn wait_for_project(&self, project_id: i64) -> ProviderResult<()> {
        wait_for_project_sync(self.api(), project_id, &self.wait, self.cancel.clone()).await
    }
}

/// Parse a stored identifier into an AWX id
pub(crate) fn parse_id(id: &ResourceId, identifier: &str) -> ProviderResult<i64> {
    parse_identifier(identifier).ok_or_else(|| {
        ProviderError::invalid_config(format!("Invalid AWX identifier '{}'", identifier))
            .for_resource(id.clone())
    })
}

/// Attach the resource id to an error unless it already names one
pub(crate) fn in_resource(id: &ResourceId) -> impl Fn(ProviderError) -> ProviderError + '_ {
    move |err| {
        if err.resource_id.is_some() {
            err
        } else {
            err.for_resource(id.clone())
        }
    }
}
