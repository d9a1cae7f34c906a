//! Blocking HTTP transport shared by the archive download and the forecast fetch

use crate::config::HttpConfig;
use crate::{Result, YrError};
use reqwest::blocking::Client;
use tracing::{debug, error, info};

/// Status and body of a completed GET request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// A single GET, nothing more. Status handling belongs to the caller.
pub trait HttpFetch {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// `reqwest` backed transport with a bounded timeout and a fixed user agent
pub struct HttpClient {
    client: Client,
    timeout_seconds: u64,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| YrError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_seconds: config.timeout_seconds,
        })
    }
}

impl HttpFetch for HttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        info!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.transport_error(url, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| self.transport_error(url, e))?
            .to_vec();

        debug!("{} answered {} with {} bytes", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

impl HttpClient {
    fn transport_error(&self, url: &str, err: reqwest::Error) -> YrError {
        if err.is_timeout() {
            error!("Request to {} timed out after {}s", url, self.timeout_seconds);
            YrError::Timeout {
                url: url.to_string(),
                seconds: self.timeout_seconds,
            }
        } else {
            error!("Request to {} failed: {}", url, err);
            YrError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}
