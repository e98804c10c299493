//! Transcript acquisition: a cascade of opportunistic YouTube strategies with a
//! bundled sample as the last resort.

pub mod captions;
pub mod innertube;
pub mod metadata;
pub mod samples;
pub mod timed_text;
pub mod video_id;
pub mod watch_page;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{error::TranscriptError, types::TranscriptSegment};

pub use innertube::InnertubeSource;
pub use metadata::MetadataClient;
pub use samples::sample_transcript;
pub use timed_text::TimedTextSource;
pub use video_id::extract_video_id;
pub use watch_page::WatchPageSource;

/// One way of getting a transcript. An empty `Ok` means "nothing found here".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptOrigin {
    /// Returned by the named strategy.
    Fetched(&'static str),
    /// Bundled sample; the real transcript was unavailable.
    Sample,
}

#[derive(Debug, Clone)]
pub struct FetchedTranscript {
    pub segments: Vec<TranscriptSegment>,
    pub origin: TranscriptOrigin,
}

impl FetchedTranscript {
    pub fn is_sample(&self) -> bool {
        self.origin == TranscriptOrigin::Sample
    }
}

/// Tries each source in order until one yields at least one segment.
pub struct TranscriptCascade {
    sources: Vec<Box<dyn TranscriptSource>>,
    use_samples: bool,
}

impl TranscriptCascade {
    pub fn new(sources: Vec<Box<dyn TranscriptSource>>) -> Self {
        Self {
            sources,
            use_samples: true,
        }
    }

    /// timedtext, then innertube, then the watch page.
    pub fn youtube(client: reqwest::Client) -> Self {
        Self::new(vec![
            Box::new(TimedTextSource::new(client.clone())),
            Box::new(InnertubeSource::new(client.clone())),
            Box::new(WatchPageSource::new(client)),
        ])
    }

    pub fn without_samples(mut self) -> Self {
        self.use_samples = false;
        self
    }

    /// `None` only when every source failed and samples are disabled.
    pub async fn fetch(&self, video_id: &str) -> Option<FetchedTranscript> {
        for source in &self.sources {
            match source.fetch(video_id).await {
                Ok(segments) if !segments.is_empty() => {
                    info!(%video_id, strategy = source.name(), segments = segments.len(), "transcript fetched");
                    return Some(FetchedTranscript {
                        segments,
                        origin: TranscriptOrigin::Fetched(source.name()),
                    });
                }
                Ok(_) => debug!(%video_id, strategy = source.name(), "strategy found no segments"),
                Err(e) => warn!(%video_id, strategy = source.name(), error = %e, "strategy failed"),
            }
        }

        if !self.use_samples {
            warn!(%video_id, "no transcript available");
            return None;
        }

        warn!(%video_id, "all transcript strategies failed, using sample transcript");
        Some(FetchedTranscript {
            segments: sample_transcript(video_id),
            origin: TranscriptOrigin::Sample,
        })
    }
}
