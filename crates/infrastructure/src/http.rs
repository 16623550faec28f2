//! Reqwest-backed HTTP client
//!
//! Translates a [`PreparedRequest`] into a reqwest call and captures the
//! response into a [`ResponseSpec`]. File-backed bodies and multipart file
//! parts are read here, at the edge.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use reqwest::redirect::Policy;
use tracing::debug;

use quiver_application::{HttpClient, HttpClientError, PreparedBody, PreparedRequest};
use quiver_domain::ResponseSpec;

/// Transport configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Redirect limit; `0` disables redirects.
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_redirects: 10,
        }
    }
}

/// [`HttpClient`] implementation on top of reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ReqwestHttpClient {
    /// Builds a client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, HttpClientError> {
        let redirect = if config.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(config.max_redirects)
        };
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(redirect)
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Builds a client with default configuration.
    pub fn with_defaults() -> Result<Self, HttpClientError> {
        Self::new(ClientConfig::default())
    }

    async fn send(&self, request: &PreparedRequest) -> Result<ResponseSpec, HttpClientError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        let mut builder = self.client.request(method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = attach_body(builder, &request.body, &request.headers).await?;

        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| map_error(&e, &self.config))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_error(&e, &self.config))?;
        let duration = started.elapsed();

        debug!(status, elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX), "response received");
        Ok(ResponseSpec::new(status, headers, body.to_vec(), duration))
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(
        &self,
        request: &PreparedRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + '_>> {
        let request = request.clone();
        Box::pin(async move { self.send(&request).await })
    }
}

async fn attach_body(
    mut builder: reqwest::RequestBuilder,
    body: &PreparedBody,
    headers: &std::collections::HashMap<String, String>,
) -> Result<reqwest::RequestBuilder, HttpClientError> {
    let has_content_type = headers
        .keys()
        .any(|k| k.eq_ignore_ascii_case("content-type"));

    match body {
        PreparedBody::None => {}
        PreparedBody::Raw { content, json } => {
            if !has_content_type {
                let content_type = if json.is_some() {
                    "application/json"
                } else {
                    "text/plain"
                };
                builder = builder.header("Content-Type", content_type);
            }
            builder = builder.body(content.clone());
        }
        PreparedBody::Form { fields } => {
            let encoded = serde_urlencoded::to_string(fields)
                .map_err(|e| HttpClientError::InvalidBody(e.to_string()))?;
            builder = builder
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(encoded);
        }
        PreparedBody::Multipart { parts } => {
            let mut form = reqwest::multipart::Form::new();
            for part in parts {
                if part.is_file {
                    let bytes = tokio::fs::read(&part.value)
                        .await
                        .map_err(|e| HttpClientError::InvalidBody(e.to_string()))?;
                    let file_name = std::path::Path::new(&part.value)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| part.value.clone());
                    let mime = mime_guess::from_path(&part.value)
                        .first_or_octet_stream()
                        .essence_str()
                        .to_string();
                    let file_part = reqwest::multipart::Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&mime)
                        .map_err(|e| HttpClientError::InvalidBody(e.to_string()))?;
                    form = form.part(part.key.clone(), file_part);
                } else {
                    form = form.text(part.key.clone(), part.value.clone());
                }
            }
            builder = builder.multipart(form);
        }
        PreparedBody::GraphQl { query, variables } => {
            let mut payload = serde_json::Map::new();
            payload.insert("query".to_string(), serde_json::Value::String(query.clone()));
            if let Some(variables) = variables {
                payload.insert("variables".to_string(), variables.clone());
            }
            builder = builder.json(&serde_json::Value::Object(payload));
        }
        PreparedBody::File { path } => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| HttpClientError::InvalidBody(e.to_string()))?;
            if !has_content_type {
                let mime = mime_guess::from_path(path)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string();
                builder = builder.header("Content-Type", mime);
            }
            builder = builder.body(bytes);
        }
        PreparedBody::Binary { content } => {
            builder = builder.body(content.clone().into_bytes());
        }
    }

    Ok(builder)
}

fn map_error(error: &reqwest::Error, config: &ClientConfig) -> HttpClientError {
    if error.is_timeout() {
        return HttpClientError::Timeout {
            timeout_ms: u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX),
        };
    }
    if error.is_redirect() {
        return HttpClientError::TooManyRedirects {
            max: config.max_redirects,
        };
    }
    if error.is_connect() {
        let message = error.to_string();
        if message.contains("dns") {
            return HttpClientError::DnsError {
                host: error
                    .url()
                    .and_then(|u| u.host_str())
                    .unwrap_or("unknown")
                    .to_string(),
                message,
            };
        }
        return HttpClientError::ConnectionFailed(message);
    }
    if error.is_builder() {
        return HttpClientError::InvalidUrl(error.to_string());
    }
    if error.is_body() || error.is_request() {
        return HttpClientError::InvalidBody(error.to_string());
    }
    HttpClientError::Other(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_redirects, 10);
    }

    #[test]
    fn test_client_builds() {
        assert!(ReqwestHttpClient::with_defaults().is_ok());
        assert!(ReqwestHttpClient::new(ClientConfig {
            timeout: Duration::from_secs(1),
            max_redirects: 0,
        })
        .is_ok());
    }
}
