use std::num::NonZeroU32;

use crate::{
    format::{concatenate_text, format_timestamp, parse_timestamp},
    types::TranscriptSegment,
};

pub const DEFAULT_INTERVAL_SECONDS: NonZeroU32 = NonZeroU32::new(15).unwrap();

/// Fixed-width window of the transcript, keyed by its start timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub key: String,
    pub start_seconds: u64,
    pub end_seconds: u64,
    pub segments: Vec<TranscriptSegment>,
}

impl Bucket {
    pub fn text(&self) -> String {
        concatenate_text(&self.segments)
    }

    pub fn contains(&self, seconds: u64) -> bool {
        self.start_seconds <= seconds && seconds < self.end_seconds
    }
}

/// Start, in whole seconds, of the bucket covering `seconds`.
pub fn bucket_start(seconds: f64, interval: NonZeroU32) -> u64 {
    let interval = u64::from(interval.get());
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    (seconds / interval) * interval
}

pub fn bucket_key(seconds: f64, interval: NonZeroU32) -> String {
    format_timestamp(bucket_start(seconds, interval) as f64)
}

/// Partition a transcript into contiguous buckets covering the whole video,
/// empty windows included. Buckets come back in ascending time order.
pub fn segment_transcript(transcript: &[TranscriptSegment], interval: NonZeroU32) -> Vec<Bucket> {
    let width = u64::from(interval.get());
    let max_seconds = transcript
        .iter()
        .map(|seg| parse_timestamp(&seg.timestamp))
        .max()
        .unwrap_or(0);

    let last = max_seconds.div_ceil(width);
    let mut buckets: Vec<Bucket> = (0..=last)
        .map(|i| Bucket {
            key: format_timestamp((i * width) as f64),
            start_seconds: i * width,
            end_seconds: (i + 1) * width,
            segments: Vec::new(),
        })
        .collect();

    for segment in transcript {
        let index = parse_timestamp(&segment.timestamp) / width;
        // Keys without a pre-built bucket are ignored.
        if let Some(bucket) = buckets.get_mut(index as usize) {
            bucket.segments.push(segment.clone());
        }
    }

    buckets
}
