//! HTTP Classification Backend
//!
//! Sends the image to the external classification service.
//!
//! # Service API
//!
//! - `POST /analyze` with a multipart body, one part (named `file` by
//!   default) holding the image bytes, file name and media type
//! - `200` with a JSON [`SoilAnalysis`] body on success
//! - any other status on failure, body text used as the detail
//!
//! Every call is bounded by the configured timeout and the response body is
//! read as a stream capped at `max_response_bytes`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Url;

use super::traits::{ClassificationBackend, ImagePayload};
use crate::analysis::SoilAnalysis;
use crate::config::ConfigError;
use crate::error::AnalysisError;

/// Default classification endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/analyze";

/// Default multipart field name the service expects
pub const DEFAULT_FIELD_NAME: &str = "file";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default response body cap: 1 MiB
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Connection settings for the classification endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Full URL of the analyze endpoint
    pub url: String,
    /// Bound on the whole request, connect to last byte
    pub timeout: Duration,
    /// Multipart field name for the image part
    pub field_name: String,
    /// Largest response body accepted
    pub max_response_bytes: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            field_name: DEFAULT_FIELD_NAME.to_string(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl EndpointConfig {
    /// Create a config for `url` with default timeout and limits
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the multipart field name
    #[must_use]
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Set the response size cap
    #[must_use]
    pub fn with_max_response_bytes(mut self, max: usize) -> Self {
        self.max_response_bytes = max;
        self
    }

    /// Parse and check the endpoint URL
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] unless the URL is absolute
    /// `http` or `https`.
    pub fn parsed_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.url).map_err(|e| {
            ConfigError::ValidationError(format!("invalid endpoint URL {:?}: {}", self.url, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::ValidationError(format!(
                "endpoint URL must use http or https, got {other:?}"
            ))),
        }
    }
}

/// Classification backend speaking HTTP to the external service
#[derive(Clone, Debug)]
pub struct HttpClassifier {
    url: Url,
    config: EndpointConfig,
    http_client: reqwest::Client,
}

impl HttpClassifier {
    /// Create a classifier for the given endpoint
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the URL is unusable or the
    /// HTTP client cannot be built.
    pub fn new(config: EndpointConfig) -> Result<Self, ConfigError> {
        let url = config.parsed_url()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::ValidationError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url,
            config,
            http_client,
        })
    }

    /// The endpoint this classifier posts to
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.url
    }

    /// Active settings
    #[must_use]
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    fn connection_failed(&self, err: &reqwest::Error) -> AnalysisError {
        let detail = if err.is_timeout() {
            format!(
                "request timed out after {}s",
                self.config.timeout.as_secs_f32()
            )
        } else {
            error_chain(err)
        };
        AnalysisError::ConnectionFailed { detail }
    }

    /// Read the body, stopping once it passes the cap
    ///
    /// Returns the bytes read and whether the body was cut short.
    async fn read_body(&self, response: reqwest::Response) -> Result<(Vec<u8>, bool), AnalysisError> {
        let limit = self.config.max_response_bytes;

        if let Some(len) = response.content_length() {
            if len > limit as u64 {
                tracing::warn!(len, limit, "Response body larger than limit");
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| self.connection_failed(&e))?;
            let remaining = limit.saturating_sub(body.len());
            if bytes.len() > remaining {
                body.extend_from_slice(&bytes[..remaining]);
                return Ok((body, true));
            }
            body.extend_from_slice(&bytes);
        }

        Ok((body, false))
    }
}

#[async_trait]
impl ClassificationBackend for HttpClassifier {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn classify(&self, image: ImagePayload) -> Result<SoilAnalysis, AnalysisError> {
        let start = Instant::now();
        let size = image.bytes.len();

        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.media_type)
            .map_err(|_| AnalysisError::InvalidFileType {
                media_type: image.media_type.clone(),
            })?;
        let form = Form::new().part(self.config.field_name.clone(), part);

        tracing::debug!(endpoint = %self.url, size, "Sending classification request");

        let response = self
            .http_client
            .post(self.url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.connection_failed(&e))?;

        let status = response.status();
        let (body, truncated) = self.read_body(response).await?;

        if !status.is_success() {
            let mut detail = serde_json::from_slice::<serde_json::Value>(&body)
                .ok()
                .and_then(|value| error_field(&value))
                .unwrap_or_else(|| String::from_utf8_lossy(&body).trim().to_string());
            if detail.is_empty() {
                detail = status
                    .canonical_reason()
                    .unwrap_or("request rejected")
                    .to_string();
            } else if truncated {
                detail.push_str("...");
            }

            tracing::warn!(
                endpoint = %self.url,
                status = status.as_u16(),
                "Classification request rejected"
            );
            return Err(AnalysisError::ClassificationRequestFailed {
                status: status.as_u16(),
                detail,
            });
        }

        if truncated {
            return Err(AnalysisError::MalformedResponse {
                detail: format!(
                    "response exceeded {} bytes",
                    self.config.max_response_bytes
                ),
            });
        }

        let analysis = decode_analysis(&body)?;

        tracing::info!(
            endpoint = %self.url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            texture = %analysis.texture,
            "Classification completed"
        );

        Ok(analysis)
    }
}

/// Decode a success body into a [`SoilAnalysis`]
///
/// When the body is JSON but not a valid analysis (for instance the
/// placeholder `"N/A"` labels the service sends for non-soil images), the
/// service's own message is used as the detail if it carries one.
///
/// # Errors
///
/// Returns [`AnalysisError::MalformedResponse`] when decoding fails.
pub fn decode_analysis(body: &[u8]) -> Result<SoilAnalysis, AnalysisError> {
    serde_json::from_slice::<SoilAnalysis>(body).map_err(|err| {
        let detail = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| service_message(&value))
            .unwrap_or_else(|| err.to_string());
        AnalysisError::MalformedResponse { detail }
    })
}

fn error_field(value: &serde_json::Value) -> Option<String> {
    value
        .get("error")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

fn service_message(value: &serde_json::Value) -> Option<String> {
    if let Some(error) = error_field(value) {
        return Some(error);
    }

    value
        .get("suggestions")
        .and_then(serde_json::Value::as_array)
        .and_then(|s| s.first())
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

/// Join an error and its sources into one line
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Level, Moisture, Texture};

    #[test]
    fn test_default_endpoint_config() {
        let config = EndpointConfig::default();
        assert_eq!(config.url, "http://localhost:5000/analyze");
        assert_eq!(config.field_name, "file");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_response_bytes, 1024 * 1024);
    }

    #[test]
    fn test_builder() {
        let config = EndpointConfig::new("https://soil.example/analyze")
            .with_timeout(Duration::from_secs(5))
            .with_field_name("image")
            .with_max_response_bytes(4096);

        assert_eq!(config.url, "https://soil.example/analyze");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.field_name, "image");
        assert_eq!(config.max_response_bytes, 4096);
    }

    #[test]
    fn test_url_validation() {
        assert!(EndpointConfig::default().parsed_url().is_ok());
        assert!(matches!(
            EndpointConfig::new("not a url").parsed_url(),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            EndpointConfig::new("ftp://soil.example/analyze").parsed_url(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_new_rejects_bad_url() {
        assert!(HttpClassifier::new(EndpointConfig::new("localhost:5000")).is_err());
    }

    #[test]
    fn test_decode_valid_body() {
        let body = r#"{
            "dominantColor": "Marrom",
            "texture": "arenoso",
            "moisture": "seco",
            "fertility": "baixo",
            "organicMatter": "baixo",
            "suggestions": ["Implemente sistema de irrigação"]
        }"#
        .as_bytes();

        let analysis = decode_analysis(body).unwrap();
        assert_eq!(analysis.texture, Texture::Sandy);
        assert_eq!(analysis.moisture, Moisture::Dry);
        assert_eq!(analysis.fertility, Level::Low);
        assert_eq!(analysis.suggestions.len(), 1);
    }

    #[test]
    fn test_decode_not_json() {
        let err = decode_analysis(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedResponse { .. }));
    }

    #[test]
    fn test_decode_placeholder_uses_service_suggestion() {
        let body = br#"{
            "soilType": "Nao e solo",
            "confidence": 20.0,
            "dominantColor": "N/A",
            "texture": "N/A",
            "moisture": "N/A",
            "fertility": "N/A",
            "organicMatter": "N/A",
            "suggestions": ["Image not recognised as soil. Try a clearer photo."]
        }"#;

        match decode_analysis(body).unwrap_err() {
            AnalysisError::MalformedResponse { detail } => {
                assert_eq!(detail, "Image not recognised as soil. Try a clearer photo.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_error_object() {
        let body = br#"{ "error": "model not loaded" }"#;
        match decode_analysis(body).unwrap_err() {
            AnalysisError::MalformedResponse { detail } => assert_eq!(detail, "model not loaded"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_chain_dedupes() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let outer = std::io::Error::new(std::io::ErrorKind::Other, inner);
        assert_eq!(error_chain(&outer), "connection refused");
    }
}
