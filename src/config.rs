//! Configuration and paths

use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a local media file may take to show up before giving up
pub const MEDIA_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay between two disk checks while waiting for media
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Identity sent on every remote fetch
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.88 Safari/537.36 Edg/87.0.664.66";

/// Extensions tried for a cached image, in priority order
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "gif", "jpg"];

/// Extension of cached voice clips
pub const VOICE_EXTENSION: &str = "amr";

/// Extension of a video whose path is derived from its thumbnail
pub const VIDEO_EXTENSION: &str = "mp4";

/// Client working directories and acquisition limits
#[derive(Debug, Clone)]
pub struct Config {
    /// Root holding one subdirectory per account (images, voice)
    pub workdir: PathBuf,
    /// Shared document root (videos, files)
    pub docdir: PathBuf,
    pub poll_interval: Duration,
    pub media_timeout: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        let docdir = wechat_docdir();

        Self {
            workdir: docdir.clone(),
            docdir,
            poll_interval: POLL_INTERVAL,
            media_timeout: MEDIA_DOWNLOAD_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Create config for testing with custom paths
    pub fn for_test(temp_dir: &Path) -> Self {
        Self {
            workdir: temp_dir.join("work"),
            docdir: temp_dir.join("docs"),
            poll_interval: Duration::from_millis(20),
            media_timeout: Duration::from_millis(400),
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Working subdirectory of one account
    pub fn sender_dir(&self, sender: &str) -> PathBuf {
        self.workdir.join(sender)
    }
}

/// User documents directory, falling back to the pre-Vista name
pub fn doc_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let documents = home.join("Documents");

    if documents.exists() {
        documents
    } else {
        home.join("My Documents")
    }
}

/// Directory the desktop client stores its per-account files under
pub fn wechat_docdir() -> PathBuf {
    doc_dir().join("WeChat Files")
}
