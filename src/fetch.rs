//! One-shot HTTP fetches for remotely hosted media

use crate::config::Config;
use crate::error::Result;
use flate2::read::GzDecoder;
use reqwest::header::{CONTENT_ENCODING, USER_AGENT};
use reqwest::Client;
use std::io::Read;
use tracing::{debug, warn};

/// Idle connections kept per host
const MAX_IDLE_PER_HOST: usize = 256;

/// Shared HTTP client. Build once at startup and clone freely; clones share
/// the same connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .build()?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }

    /// GET `url` once. Transport errors and non-success statuses are
    /// terminal; there is no retry.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(url = url, error = %e, "remote fetch failed");
                e
            })?;

        let gzipped = resp
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("gzip"));

        let body = resp.bytes().await?;
        debug!(url = url, bytes = body.len(), gzipped, "remote fetch complete");

        if gzipped {
            Ok(gunzip(&body)?)
        } else {
            Ok(body.to_vec())
        }
    }
}

/// Decode a gzip stream in full
pub fn gunzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_gunzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"sticker bytes").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(gunzip(&compressed).unwrap(), b"sticker bytes");
    }

    #[test]
    fn test_gunzip_rejects_plain_bytes() {
        assert!(gunzip(b"\x89PNG not gzip").is_err());
    }

    #[test]
    fn test_fetcher_builds() {
        let config = Config::for_test(&std::env::temp_dir());
        let fetcher = HttpFetcher::new(&config).unwrap();
        assert_eq!(fetcher.user_agent, config.user_agent);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_is_error() {
        let config = Config::for_test(&std::env::temp_dir());
        let fetcher = HttpFetcher::new(&config).unwrap();
        assert!(fetcher.fetch("not a url").await.is_err());
    }
}
