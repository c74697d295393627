//! HTTP client for the remote transform service.
//!
//! The service exposes two operations the core consumes: `POST /process`
//! (live preview; JSON envelope with a base64 payload plus metadata) and
//! `POST /download` (final file body). Both take the image as a multipart
//! `file` part and the parameter set as a flat query string. Error bodies
//! are JSON `{ "detail": ... }`.

use std::time::Duration;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;
use crate::core::{SourceImage, TransformParameters};
use crate::processing::service::{TransformOutput, TransformService};
use crate::utils::{ImageFormat, StudioError, StudioResult};

#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    pub base_url: String,
    /// Bound on the whole request; a timeout is handled like any other
    /// network failure.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl HttpServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Metadata block of a `/process` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessMetadata {
    #[serde(default)]
    pub original_size: u64,
    #[serde(default)]
    pub processed_size: u64,
    #[serde(default)]
    pub original_dimensions: [u32; 2],
    pub processed_dimensions: [u32; 2],
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub compression_ratio: f64,
    #[serde(default)]
    pub background_removed: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ProcessResponseBody {
    success: bool,
    /// Base64-encoded processed image
    image: String,
    metadata: ProcessMetadata,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Feature probe payload (`GET /features`).
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceFeatures {
    #[serde(default)]
    pub background_removal: bool,
}

/// Production [`TransformService`] over the service's HTTP surface.
pub struct HttpTransformService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransformService {
    pub fn new(base_url: impl Into<String>) -> StudioResult<Self> {
        Self::with_config(HttpServiceConfig::new(base_url))
    }

    pub fn with_config(config: HttpServiceConfig) -> StudioResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Queries which optional features the service was deployed with.
    pub async fn features(&self) -> StudioResult<ServiceFeatures> {
        let response = self
            .client
            .get(format!("{}/features", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::response_error(response).await);
        }
        Ok(response.json().await?)
    }

    fn file_part(image: &SourceImage) -> StudioResult<Part> {
        let file_name = format!("image.{}", image.format().primary_extension());
        Part::stream(image.bytes().clone())
            .file_name(file_name)
            .mime_str(image.mime_type())
            .map_err(|e| StudioError::service(format!("Invalid source MIME type: {e}")))
    }

    async fn response_error(response: reqwest::Response) -> StudioError {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => StudioError::service(body.detail),
            Err(_) => StudioError::service(format!("Service returned {status}")),
        }
    }
}

/// Unpacks a `/process` envelope into the preview payload.
///
/// Falls back to the requested format when the service omits the one it
/// actually encoded.
fn unpack_process_response(
    body: ProcessResponseBody,
    requested_format: ImageFormat,
) -> StudioResult<TransformOutput> {
    if !body.success {
        return Err(StudioError::service("Service reported failure"));
    }
    let decoded = BASE64
        .decode(body.image.as_bytes())
        .map_err(|e| StudioError::service(format!("Payload is not valid base64: {e}")))?;
    let [width, height] = body.metadata.processed_dimensions;
    let format = body
        .metadata
        .format
        .as_deref()
        .and_then(|name| name.parse().ok())
        .unwrap_or(requested_format);
    Ok(TransformOutput {
        byte_size: decoded.len() as u64,
        bytes: Bytes::from(decoded),
        width,
        height,
        format,
    })
}

#[async_trait]
impl TransformService for HttpTransformService {
    async fn transform(
        &self,
        image: &SourceImage,
        params: &TransformParameters,
    ) -> StudioResult<TransformOutput> {
        let form = Form::new().part("file", Self::file_part(image)?);
        let response = self
            .client
            .post(format!("{}/process", self.base_url))
            .query(params)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::response_error(response).await);
        }
        let body: ProcessResponseBody = response.json().await?;
        let output = unpack_process_response(body, params.format)?;
        debug!(
            "Transform response: {} bytes, {}x{} {}",
            output.byte_size, output.width, output.height, output.format
        );
        Ok(output)
    }

    async fn download(
        &self,
        image: &SourceImage,
        params: &TransformParameters,
    ) -> StudioResult<Bytes> {
        let form = Form::new().part("file", Self::file_part(image)?);
        let response = self
            .client
            .post(format!("{}/download", self.base_url))
            .query(params)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::response_error(response).await);
        }
        Ok(response.bytes().await?)
    }
}
