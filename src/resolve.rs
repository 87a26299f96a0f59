//! Media resolver
//!
//! The client announces a message before it has finished writing the media
//! file, so local media is polled for until it shows up or the deadline
//! passes. Stickers live on a CDN and are fetched instead.

use crate::config::{Config, IMAGE_EXTENSIONS, VIDEO_EXTENSION, VOICE_EXTENSION};
use crate::error::Result;
use crate::fetch::HttpFetcher;
use crate::record::{BlobData, MediaReference, MediaSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of a media acquisition that did not hit a transport error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaOutcome {
    Ready(BlobData),
    /// Nothing appeared on disk before the deadline
    Unavailable,
}

/// Last component of a path hint. Hints may come from a Windows client, so
/// both separators count.
pub fn base_name(hint: &str) -> &str {
    hint.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(hint)
}

/// Local paths that may hold the referenced media, in the order they are
/// checked. Empty for remotely hosted media.
pub fn candidate_paths(config: &Config, reference: &MediaReference) -> Vec<PathBuf> {
    match &reference.source {
        MediaSource::Image { file_path } => {
            let base = base_name(file_path);
            if base.is_empty() {
                return Vec::new();
            }
            let verbatim = config.sender_dir(&reference.sender).join(base);
            let mut paths = vec![verbatim.clone()];
            paths.extend(IMAGE_EXTENSIONS.iter().map(|ext| verbatim.with_extension(ext)));
            paths
        }
        MediaSource::Voice { client_msg_id } => vec![config
            .sender_dir(&reference.sender)
            .join(format!("{}.{}", client_msg_id, VOICE_EXTENSION))],
        MediaSource::Video {
            file_path,
            thumbnail,
        } => {
            if !file_path.is_empty() {
                vec![config.docdir.join(file_path)]
            } else {
                vec![config.docdir.join(thumbnail).with_extension(VIDEO_EXTENSION)]
            }
        }
        MediaSource::File { file_path } => vec![config.docdir.join(file_path)],
        MediaSource::Sticker { .. } => Vec::new(),
    }
}

/// Read a candidate if it exists and is readable
async fn read_candidate(path: &Path) -> Option<BlobData> {
    let binary = tokio::fs::read(path).await.ok()?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Some(BlobData { name, binary })
}

/// Check `candidates` in order every `interval` until one is readable or
/// `deadline` elapses.
pub async fn poll_candidates(
    candidates: &[PathBuf],
    interval: Duration,
    deadline: Duration,
) -> MediaOutcome {
    let started = Instant::now();

    let poll = async {
        let mut round: u32 = 0;
        loop {
            round += 1;
            for path in candidates {
                if let Some(blob) = read_candidate(path).await {
                    info!(
                        path = %path.display(),
                        round = round,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        bytes = blob.binary.len(),
                        "media ready"
                    );
                    return blob;
                }
            }
            debug!(round = round, candidates = candidates.len(), "media not on disk yet");
            tokio::time::sleep(interval).await;
        }
    };

    match tokio::time::timeout(deadline, poll).await {
        Ok(blob) => MediaOutcome::Ready(blob),
        Err(_) => {
            warn!(
                first_candidate = ?candidates.first(),
                deadline_ms = deadline.as_millis() as u64,
                "media not available within deadline"
            );
            MediaOutcome::Unavailable
        }
    }
}

/// Turns media references into bytes. Cheap to clone; clones share the
/// configuration and HTTP connection pool.
#[derive(Debug, Clone)]
pub struct MediaResolver {
    config: Arc<Config>,
    fetcher: HttpFetcher,
}

impl MediaResolver {
    pub fn new(config: Arc<Config>, fetcher: HttpFetcher) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Acquire the media behind `reference`. Only a failed remote fetch is
    /// an error; local media that never appears is `Unavailable`.
    pub async fn resolve(&self, reference: &MediaReference) -> Result<MediaOutcome> {
        if let MediaSource::Sticker { cdn_url, aes_key } = &reference.source {
            // Stickers are named by their key, not by anything in the URL
            let binary = self.fetcher.fetch(cdn_url).await?;
            return Ok(MediaOutcome::Ready(BlobData::new(aes_key.clone(), binary)));
        }

        let candidates = candidate_paths(&self.config, reference);
        debug!(kind = ?reference.kind(), sender = %reference.sender, candidates = ?candidates, "resolving media");

        Ok(poll_candidates(&candidates, self.config.poll_interval, self.config.media_timeout).await)
    }

    /// Resolve on its own task so several messages can wait in parallel
    pub fn spawn(&self, reference: MediaReference) -> JoinHandle<Result<MediaOutcome>> {
        let resolver = self.clone();
        tokio::spawn(async move { resolver.resolve(&reference).await })
    }
}
