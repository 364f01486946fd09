//! PokeAPI HTTP client
//!
//! No retry or rate limiting here; callers own the retry policy.

use super::{BaseFormRecord, EvolutionChainRecord, RecordSource, SourceError, SpeciesRecord};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default API root
pub const POKEAPI_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// HTTP implementation of [`RecordSource`]
pub struct PokeApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl PokeApiClient {
    /// Build a client against `base_url` with a per-request timeout
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn resource_url(&self, resource: &str, id: u32) -> String {
        format!("{}/{}/{}/", self.base_url, resource, id)
    }

    async fn get_json<T: DeserializeOwned>(&self, resource: &str, id: u32) -> Result<T, SourceError> {
        let url = self.resource_url(resource, id);

        tracing::trace!(url = %url, "Querying PokeAPI");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(format!("{}/{}", resource, id)));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::ParseError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl RecordSource for PokeApiClient {
    async fn species(&self, id: u32) -> Result<SpeciesRecord, SourceError> {
        self.get_json("pokemon-species", id).await
    }

    async fn base_form(&self, id: u32) -> Result<BaseFormRecord, SourceError> {
        self.get_json("pokemon", id).await
    }

    async fn evolution_chain(&self, id: u32) -> Result<EvolutionChainRecord, SourceError> {
        self.get_json("evolution-chain", id).await
    }
}
