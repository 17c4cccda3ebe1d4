use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use scraper::Html;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::utils::truncate_for_log;

// The topic listing rejects unidentified clients, so the shared client
// announces itself as a desktop browser.
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
            "AppleWebKit/537.36 (KHTML, like Gecko) ",
            "Chrome/115.0.0.0 Safari/537.36"
        ))
        .timeout(Duration::from_secs(20))
        .pool_idle_timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("failed to build reqwest client")
});

/// Failure modes for a single page fetch. There is no retry at this layer.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },
    #[error("GET {url} returned status {status}")]
    Status { status: StatusCode, url: String },
}

/// The seam between traversal and the network. Implemented by [`PageFetcher`]
/// for real runs and by scripted stubs in tests.
pub trait FetchAsync {
    async fn fetch(&self, url: &str) -> Result<Html, FetchError>;
}

/// HTTP fetcher backed by the shared client. Optionally saves the body of its
/// first successful fetch to a file for selector debugging.
pub struct PageFetcher {
    capture_path: Option<PathBuf>,
    captured: AtomicBool,
}

impl PageFetcher {
    pub fn new() -> Self {
        Self {
            capture_path: None,
            captured: AtomicBool::new(false),
        }
    }

    pub fn with_capture(path: PathBuf) -> Self {
        Self {
            capture_path: Some(path),
            captured: AtomicBool::new(false),
        }
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let res = CLIENT
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                source: e,
            })?;
        let status = res.status();
        debug!(%status, "GET completed");
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }
        let body = res.text().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: e,
        })?;
        debug!(preview = %truncate_for_log(&body, 500), "Response body preview");
        Ok(body)
    }

    /// The first successful body goes to the capture file; later ones do not.
    fn capture_once(&self, body: &str) {
        let Some(path) = &self.capture_path else {
            return;
        };
        if self.captured.swap(true, Ordering::SeqCst) {
            return;
        }
        match std::fs::write(path, body) {
            Ok(()) => info!(path = %path.display(), "Captured first response body"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to write capture file"),
        }
    }
}

impl FetchAsync for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<Html, FetchError> {
        let body = self.get_body(url).await?;
        self.capture_once(&body);
        Ok(Html::parse_document(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_status_display() {
        let err = FetchError::Status {
            status: StatusCode::FORBIDDEN,
            url: "https://www.channelnewsasia.com/topic/singapore-politics".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("singapore-politics"));
    }

    #[test]
    fn test_capture_once_keeps_only_first_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.html");
        let fetcher = PageFetcher::with_capture(path.clone());

        fetcher.capture_once("<html>first</html>");
        fetcher.capture_once("<html>second</html>");

        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(saved, "<html>first</html>");
    }

    #[test]
    fn test_capture_disabled_by_default() {
        let fetcher = PageFetcher::new();
        fetcher.capture_once("<html></html>");
        assert!(!fetcher.captured.load(Ordering::SeqCst));
    }
}
