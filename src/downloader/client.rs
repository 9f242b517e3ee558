// SPDX-License-Identifier: GPL-3.0-only
use reqwest::{Client, Response};
use url::Url;

/// Shared HTTP client for host-side transfers.
///
/// No timeout is configured; transfers end through the host's cancellation token.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(user_agent: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent.to_string());
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Send a plain GET; redirects follow reqwest's default policy
    pub async fn get(&self, url: &Url) -> reqwest::Result<Response> {
        self.client.get(url.clone()).send().await
    }
}
