//! A `reqwest`-based transport that follows redirects by hand so that every
//! hop can be counted.

use crate::config::NetworkConfig;
use crate::core::{FollowResult, Transport};
use crate::lookup::LookupError;
use async_trait::async_trait;
use reqwest::{header::LOCATION, redirect::Policy, Client, Method, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// HTTP transport with automatic redirects disabled.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport from the network configuration.
    pub fn new(config: &NetworkConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Sends a HEAD request, retrying with GET when the server refuses HEAD.
    async fn request(&self, url: &str) -> Result<reqwest::Response, LookupError> {
        let response = self.client.request(Method::HEAD, url).send().await?;
        if response.status() == StatusCode::METHOD_NOT_ALLOWED {
            debug!(url, "HEAD not allowed, retrying with GET");
            return Ok(self.client.get(url).send().await?);
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self))]
    async fn follow(&self, url: &str, max_redirects: u32) -> Result<FollowResult, LookupError> {
        let mut current = Url::parse(url).map_err(|e| LookupError::InvalidResponse(e.to_string()))?;
        let mut redirect_count = 0;

        loop {
            let response = self.request(current.as_str()).await?;
            let status = response.status();

            if !status.is_redirection() || redirect_count >= max_redirects {
                return Ok(FollowResult {
                    final_url: current.to_string(),
                    status_code: status.as_u16(),
                    redirect_count,
                });
            }

            let location = match response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
            {
                Some(location) => location.to_string(),
                None => {
                    return Ok(FollowResult {
                        final_url: current.to_string(),
                        status_code: status.as_u16(),
                        redirect_count,
                    })
                }
            };

            let next = current
                .join(&location)
                .map_err(|e| LookupError::InvalidResponse(format!("bad Location header: {}", e)))?;
            debug!(from = %current, to = %next, "Following redirect");
            current = next;
            redirect_count += 1;
        }
    }

    #[instrument(skip(self))]
    async fn probe(&self, url: &str) -> Result<u16, LookupError> {
        let response = self.request(url).await?;
        Ok(response.status().as_u16())
    }
}
