//! Backend API client
//!
//! Issues the generation request and every payment call against the
//! tokenomics backend. Each call is a single request; nothing here retries.

use reqwest::{header::{HeaderMap, HeaderValue, CONTENT_TYPE}, Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use url::Url;

use tokenomics_core::{
    CheckoutSession, CheckoutStatusResponse, CryptoPaymentConfirmation, CryptoPaymentQuote,
    CryptoPaymentRequest, PackageTier, PaymentAck, ProjectRequest, TokenomicsProject,
    TokenomicsResult,
};

use super::ClientError;
use crate::config::Config;
use crate::payment::{CheckoutBackend, CryptoPaymentBackend};

pub struct BackendClient {
    /// HTTP client for API requests
    client: Client,
    /// Backend root, e.g. `https://tokenomics.example/`
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(&config.api.base_url, config.request_timeout())
    }

    /// Resolves `/api/<segments...>` under the base URL, percent-encoding
    /// each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    /// Sends the project request and waits for the generated design.
    #[instrument(skip(self, request), fields(project_type = %request.project_type))]
    pub async fn generate(&self, request: &ProjectRequest) -> Result<TokenomicsResult, ClientError> {
        let url = self.endpoint(&["tokenomics", "generate"])?;
        info!(project = %request.display_name(), "Requesting tokenomics generation");

        let response = self.client.post(url).json(request).send().await?;
        let result: TokenomicsResult = read_json(response).await.map_err(|e| {
            error!("Tokenomics generation failed: {}", e);
            e
        })?;

        info!(
            project_id = %result.project.id,
            allocations = result.project.allocations.len(),
            total_supply = result.project.total_supply,
            "Tokenomics generated"
        );
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn get_project(&self, project_id: &str) -> Result<TokenomicsProject, ClientError> {
        let url = self.endpoint(&["tokenomics", project_id])?;
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    /// Downloads the rendered document for a project.
    #[instrument(skip(self))]
    pub async fn fetch_document(&self, project_id: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint(&["tokenomics", project_id, "pdf"])?;
        let response = check_status(self.client.get(url).send().await?).await?;
        let bytes = response.bytes().await?;
        debug!(size = bytes.len(), "Document downloaded");
        Ok(bytes.to_vec())
    }
}

impl CheckoutBackend for BackendClient {
    async fn create_checkout_session(
        &self,
        package: PackageTier,
        origin_url: &str,
    ) -> Result<CheckoutSession, ClientError> {
        let url = self.endpoint(&["payments", "checkout", "session"])?;
        debug!(package = %package, origin_url, "Creating checkout session");

        let response = self
            .client
            .post(url)
            .query(&[("package_id", package.id()), ("origin_url", origin_url)])
            .send()
            .await?;
        read_json(response).await
    }

    async fn checkout_status(&self, session_id: &str) -> Result<CheckoutStatusResponse, ClientError> {
        let url = self.endpoint(&["payments", "checkout", "status", session_id])?;
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }
}

impl CryptoPaymentBackend for BackendClient {
    async fn create_crypto_payment(
        &self,
        request: &CryptoPaymentRequest,
    ) -> Result<CryptoPaymentQuote, ClientError> {
        let url = self.endpoint(&["payments", "crypto", "create"])?;
        let response = self.client.post(url).json(request).send().await?;
        read_json(response).await
    }

    async fn confirm_crypto_payment(
        &self,
        confirmation: &CryptoPaymentConfirmation,
    ) -> Result<PaymentAck, ClientError> {
        let url = self.endpoint(&["payments", "crypto", "confirm"])?;
        let response = self.client.post(url).json(confirmation).send().await?;
        read_json(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::from_status(status.as_u16(), &body))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = check_status(response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}
