//! Image synthesis adapters.
//!
//! Four very different transports behind one interface: Pollinations
//! (prompt-in-URL GET returning raw bytes), Craiyon (JSON with base64
//! payloads), Prodia (job creation plus bounded status polling) and
//! Imagine (multipart POST returning raw bytes).

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use forge_models::encoding::MIN_IMAGE_BYTES;
use forge_models::{Artifact, CapabilityTier, GenerationRequest, ProviderDescriptor};

use crate::adapter::{image_spec, ProviderAdapter};
use crate::error::{clip_detail, ProviderError, ProviderResult};

const POLLINATIONS_BASE: &str = "https://image.pollinations.ai";
const CRAIYON_BASE: &str = "https://api.craiyon.com";
const PRODIA_BASE: &str = "https://api.prodia.com/v1";
const IMAGINE_BASE: &str = "https://api.vyro.ai/v1";

/// A 200 response with a sub-minimum body is a validation failure,
/// never a success.
fn require_image_body(bytes: &[u8]) -> ProviderResult<()> {
    if (bytes.len() as u64) < MIN_IMAGE_BYTES {
        return Err(ProviderError::validation(format!(
            "image body too small: {} bytes",
            bytes.len()
        )));
    }
    Ok(())
}

/// Reject a non-2xx response with its body as detail.
async fn check_status(response: reqwest::Response) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::bad_response(
        Some(status.as_u16()),
        clip_detail(body),
    ))
}

/// Pollinations: free image endpoint, prompt embedded in the URL path.
pub struct PollinationsAdapter {
    descriptor: ProviderDescriptor,
    base_url: String,
    client: Client,
}

impl PollinationsAdapter {
    pub fn new() -> Self {
        Self {
            descriptor: ProviderDescriptor::new("pollinations", CapabilityTier::Fast)
                .with_timeout(Duration::from_secs(45)),
            base_url: POLLINATIONS_BASE.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.descriptor = self.descriptor.with_timeout(timeout);
        self
    }
}

impl Default for PollinationsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for PollinationsAdapter {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, request: &GenerationRequest) -> ProviderResult<Artifact> {
        let spec = image_spec(request)?;

        let url = format!(
            "{}/prompt/{}?width={}&height={}&nologo=true",
            self.base_url,
            urlencoding::encode(&spec.prompt),
            spec.width,
            spec.height
        );
        debug!(provider = "pollinations", %url, "Fetching image");

        let response = self
            .client
            .get(&url)
            .timeout(self.descriptor.timeout)
            .send()
            .await?;
        let response = check_status(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let bytes = response.bytes().await?;
        require_image_body(&bytes)?;

        Ok(Artifact::bytes(bytes.to_vec(), content_type))
    }
}

/// Craiyon JSON response: base64-encoded images.
#[derive(Debug, Deserialize)]
struct CraiyonResponse {
    images: Vec<String>,
}

/// Craiyon: JSON POST, images returned base64-encoded.
pub struct CraiyonAdapter {
    descriptor: ProviderDescriptor,
    base_url: String,
    client: Client,
}

impl CraiyonAdapter {
    pub fn new() -> Self {
        Self {
            descriptor: ProviderDescriptor::new("craiyon", CapabilityTier::Fast)
                .with_timeout(Duration::from_secs(60)),
            base_url: CRAIYON_BASE.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for CraiyonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for CraiyonAdapter {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, request: &GenerationRequest) -> ProviderResult<Artifact> {
        let spec = image_spec(request)?;

        let response = self
            .client
            .post(format!("{}/v3", self.base_url))
            .timeout(self.descriptor.timeout)
            .json(&serde_json::json!({ "prompt": spec.prompt }))
            .send()
            .await?;
        let response = check_status(response).await?;

        let parsed: CraiyonResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::bad_response(None, format!("malformed body: {}", e)))?;

        let first = parsed
            .images
            .first()
            .ok_or_else(|| ProviderError::bad_response(None, "no images in response"))?;

        let data = BASE64
            .decode(first.trim())
            .map_err(|e| ProviderError::bad_response(None, format!("invalid base64 image: {}", e)))?;
        require_image_body(&data)?;

        Ok(Artifact::bytes(data, "image/jpeg"))
    }
}

/// Prodia job creation response.
#[derive(Debug, Deserialize)]
struct ProdiaJob {
    job: String,
}

/// Prodia job status response.
#[derive(Debug, Deserialize)]
struct ProdiaJobStatus {
    status: String,
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
}

/// Prodia: create a generation job, poll it, then fetch the image.
pub struct ProdiaAdapter {
    descriptor: ProviderDescriptor,
    base_url: String,
    api_key: String,
    client: Client,
    poll_interval: Duration,
    max_polls: u32,
}

impl ProdiaAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            descriptor: ProviderDescriptor::new("prodia", CapabilityTier::Quality)
                .with_timeout(Duration::from_secs(60)),
            base_url: PRODIA_BASE.to_string(),
            api_key: api_key.into(),
            client: Client::new(),
            poll_interval: Duration::from_millis(500),
            max_polls: 60,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }
}

#[async_trait]
impl ProviderAdapter for ProdiaAdapter {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, request: &GenerationRequest) -> ProviderResult<Artifact> {
        let spec = image_spec(request)?;

        let response = self
            .client
            .post(format!("{}/sd/generate", self.base_url))
            .header("X-Prodia-Key", &self.api_key)
            .timeout(self.descriptor.timeout)
            .json(&serde_json::json!({
                "prompt": spec.prompt,
                "width": spec.width,
                "height": spec.height,
            }))
            .send()
            .await?;
        let response = check_status(response).await?;

        let job: ProdiaJob = response
            .json()
            .await
            .map_err(|e| ProviderError::bad_response(None, format!("malformed job body: {}", e)))?;
        debug!(provider = "prodia", job = %job.job, "Polling generation job");

        for _ in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(format!("{}/job/{}", self.base_url, job.job))
                .header("X-Prodia-Key", &self.api_key)
                .timeout(self.descriptor.timeout)
                .send()
                .await?;
            let response = check_status(response).await?;

            let status: ProdiaJobStatus = response.json().await.map_err(|e| {
                ProviderError::bad_response(None, format!("malformed status body: {}", e))
            })?;

            match status.status.as_str() {
                "succeeded" => {
                    let image_url = status.image_url.ok_or_else(|| {
                        ProviderError::bad_response(None, "job succeeded without an image URL")
                    })?;
                    let response = self
                        .client
                        .get(&image_url)
                        .timeout(self.descriptor.timeout)
                        .send()
                        .await?;
                    let response = check_status(response).await?;
                    let bytes = response.bytes().await?;
                    require_image_body(&bytes)?;
                    return Ok(Artifact::bytes(bytes.to_vec(), "image/png"));
                }
                "failed" => {
                    return Err(ProviderError::bad_response(None, "generation job failed"));
                }
                _ => continue,
            }
        }

        // The service kept answering; its answer was just never a finished
        // job. That is a bad response, not a deadline expiry.
        Err(ProviderError::bad_response(
            None,
            format!("job {} unfinished after {} polls", job.job, self.max_polls),
        ))
    }
}

/// Imagine (Vyro): multipart POST returning raw image bytes.
pub struct ImagineAdapter {
    descriptor: ProviderDescriptor,
    base_url: String,
    api_key: String,
    style_id: String,
    client: Client,
}

impl ImagineAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            descriptor: ProviderDescriptor::new("imagine", CapabilityTier::Quality)
                .with_timeout(Duration::from_secs(60)),
            base_url: IMAGINE_BASE.to_string(),
            api_key: api_key.into(),
            style_id: "30".to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_style(mut self, style_id: impl Into<String>) -> Self {
        self.style_id = style_id.into();
        self
    }
}

#[async_trait]
impl ProviderAdapter for ImagineAdapter {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, request: &GenerationRequest) -> ProviderResult<Artifact> {
        let spec = image_spec(request)?;

        let form = reqwest::multipart::Form::new()
            .text("prompt", spec.prompt.clone())
            .text("style_id", self.style_id.clone())
            .text("aspect_ratio", format!("{}:{}", spec.width, spec.height));

        let response = self
            .client
            .post(format!(
                "{}/imagine/api/generations/text-to-image",
                self.base_url
            ))
            .bearer_auth(&self.api_key)
            .timeout(self.descriptor.timeout)
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();

        let bytes = response.bytes().await?;
        require_image_body(&bytes)?;

        Ok(Artifact::bytes(bytes.to_vec(), content_type))
    }
}
