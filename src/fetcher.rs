// 🌐 Page Fetcher - one GET per insert, no retries

use crate::config::Config;
use anyhow::{Context, Result};
use reqwest::Client;

pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(PageFetcher { client })
    }

    /// Fetch a page body; any non-2xx status is an error
    pub async fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed: {}", url))?
            .error_for_status()
            .with_context(|| format!("Bad response from {}", url))?;

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))?;

        log::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_config() -> Config {
        let vars: HashMap<String, String> =
            HashMap::from([("MONSTER_HTTP_TIMEOUT_SECS".to_string(), "5".to_string())]);
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let url = test_server::serve("200 OK", "<p>버섯</p>".to_string()).await;
        let fetcher = PageFetcher::new(&test_config()).unwrap();

        let body = fetcher.fetch(&format!("{}/wiki/Mushroom", url)).await.unwrap();

        assert_eq!(body, "<p>버섯</p>");
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_error() {
        let url = test_server::serve("404 Not Found", "missing".to_string()).await;
        let fetcher = PageFetcher::new(&test_config()).unwrap();

        assert!(fetcher.fetch(&url).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_malformed_url_is_error() {
        let fetcher = PageFetcher::new(&test_config()).unwrap();

        assert!(fetcher.fetch("not a url").await.is_err());
    }
}
