//! HTTP client for the external metadata registry

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::constants;
use super::models::{ExternalProgramTree, ProgramType, RegistryDomain};
use super::wire::{WireDataSet, WireProgram};
use crate::config::models::Instance;

/// Source of external program trees.
///
/// The reconciliation engine depends only on this trait, so tests can
/// substitute a canned reader for the live registry.
#[async_trait]
pub trait ProgramReader: Send + Sync {
    /// Fetch and validate the full tree for one program or dataset.
    async fn fetch_program_tree(
        &self,
        domain: RegistryDomain,
        program_id: &str,
        program_type: Option<ProgramType>,
    ) -> Result<ExternalProgramTree>;
}

/// Registry client with connection pooling and basic auth
#[derive(Clone)]
pub struct RegistryClient {
    base_url: String,
    http_client: reqwest::Client,
    username: String,
    password: String,
}

impl RegistryClient {
    pub fn new(base_url: String, username: String, password: String) -> Self {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)           // Max idle connections per host
            .pool_idle_timeout(Duration::from_secs(90))  // Keep connections alive for 90s
            .timeout(Duration::from_secs(60))     // Request timeout
            .connect_timeout(Duration::from_secs(10))    // Connection timeout
            .user_agent("qbank-cli/0.1")          // Custom user agent
            .build()
            .expect("Failed to build HTTP client");

        Self {
            base_url,
            http_client,
            username,
            password,
        }
    }

    /// Build a client from a stored registry instance
    pub fn from_instance(instance: &Instance) -> Self {
        Self::new(
            instance.base_url.clone(),
            instance.username.clone(),
            instance.password.clone(),
        )
    }

    /// One GET against the registry. A single attempt: transport errors
    /// and non-success statuses surface immediately, retrying is the
    /// caller's decision.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            anyhow::bail!("Registry returned {status}: {snippet}");
        }

        response
            .json::<T>()
            .await
            .context("Failed to decode registry response")
    }
}

#[async_trait]
impl ProgramReader for RegistryClient {
    async fn fetch_program_tree(
        &self,
        domain: RegistryDomain,
        program_id: &str,
        program_type: Option<ProgramType>,
    ) -> Result<ExternalProgramTree> {
        let tree = match domain {
            RegistryDomain::Tracker => {
                let url = constants::program_endpoint(&self.base_url, program_id);
                let wire: WireProgram = self.get_json(&url).await?;
                wire.into_tree(program_type)
            }
            RegistryDomain::Aggregate => {
                let url = constants::dataset_endpoint(&self.base_url, program_id);
                let wire: WireDataSet = self.get_json(&url).await?;
                wire.into_tree()
            }
        };

        log::info!(
            "Fetched {} '{}' ({} attributes, {} data elements)",
            tree.domain,
            tree.name,
            tree.attributes.len(),
            tree.element_count()
        );
        Ok(tree)
    }
}
