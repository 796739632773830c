//! Backend access for the broker context.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;
use webdsl_config::BackendConfig;
use webdsl_protocols::{FetchOptions, HttpMethod};

use crate::error::BackendError;

/// Something the broker can forward `fetchAPI` calls to.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Perform one call and return the decoded JSON body.
    async fn fetch(&self, endpoint: &str, options: &FetchOptions) -> Result<Value, BackendError>;
}

/// Backend reached over HTTP.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Self::with_client(client, &config.base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute endpoints are used as they are; anything else is appended to
    /// the base URL.
    fn resolve(&self, endpoint: &str) -> Result<Url, BackendError> {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Ok(Url::parse(endpoint)?);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path))?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch(&self, endpoint: &str, options: &FetchOptions) -> Result<Value, BackendError> {
        let url = self.resolve(endpoint)?;
        debug!("{:?} {}", options.method, url);

        let mut request = match options.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        trace!("Backend replied {}: {}", status, text);

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }
}
