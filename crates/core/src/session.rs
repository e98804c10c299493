use std::{
    num::NonZeroU32,
    sync::{Arc, Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    analysis::generate_explanations,
    assistant::QuestionContext,
    format::{concatenate_text, format_timestamp, parse_timestamp},
    generator::{ExplanationGenerator, PRIOR_CONTEXT_TITLES},
    search::search,
    segmenter::{Bucket, bucket_key, segment_transcript},
    store::ExplanationStore,
    sync::{active_explanation, active_index},
    trigger::IntervalTrigger,
    types::{ExplanationRecord, TranscriptSegment},
};

/// Transcript window fed to question answering.
pub const RECENT_TRANSCRIPT_SECONDS: f64 = 30.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    /// Seed the first bucket, then generate as playback enters new buckets.
    #[default]
    OnDemand,
    /// Generate every bucket up front.
    Batch,
}

/// What a playback tick observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub current_time: f64,
    pub bucket: String,
    pub active_index: Option<usize>,
    pub active: Option<ExplanationRecord>,
    /// Bucket key currently being generated, if any.
    pub generating: Option<String>,
    /// Whether this tick started a generation.
    pub triggered: bool,
}

pub struct Tick {
    pub snapshot: PlaybackSnapshot,
    /// Generation started by this tick. Dropping the handle detaches it.
    pub task: Option<JoinHandle<()>>,
}

struct SessionState {
    store: ExplanationStore,
    trigger: IntervalTrigger,
}

/// One viewer watching one video: a store, a trigger and the collaborators
/// that fill the store.
pub struct Session {
    id: Uuid,
    video_id: String,
    interval: NonZeroU32,
    transcript: Vec<TranscriptSegment>,
    buckets: Vec<Bucket>,
    generator: ExplanationGenerator,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(
        video_id: impl Into<String>,
        transcript: Vec<TranscriptSegment>,
        interval: NonZeroU32,
        generator: ExplanationGenerator,
    ) -> Arc<Self> {
        let buckets = segment_transcript(&transcript, interval);
        Arc::new(Self {
            id: Uuid::new_v4(),
            video_id: video_id.into(),
            interval,
            transcript,
            buckets,
            generator,
            state: Mutex::new(SessionState {
                store: ExplanationStore::new(),
                trigger: IntervalTrigger::new(interval),
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn interval(&self) -> NonZeroU32 {
        self.interval
    }

    pub fn transcript(&self) -> &[TranscriptSegment] {
        &self.transcript
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("Session state poisoned")
    }

    pub async fn seed(&self, mode: GenerationMode) {
        match mode {
            GenerationMode::Batch => self.seed_batch().await,
            GenerationMode::OnDemand => self.seed_first_bucket().await,
        }
    }

    /// Generate every bucket without holding the lock, then store them all.
    pub async fn seed_batch(&self) {
        let records = generate_explanations(&self.generator, &self.transcript, self.interval).await;
        let mut state = self.state();
        for record in records {
            state.store.insert(record);
        }
        info!(session = %self.id, explanations = state.store.len(), "session seeded");
    }

    /// On-demand sessions start with `0:00`, which the trigger never requests.
    pub async fn seed_first_bucket(&self) {
        let bucket = self.bucket_for(&format_timestamp(0.0));
        let record = self.generator.generate_for_bucket(&bucket, &[]).await;
        self.state().store.insert(record);
    }

    /// Feed the playback clock. May start one background generation.
    pub fn tick(self: &Arc<Self>, current_time: f64) -> Tick {
        let (snapshot, started) = {
            let mut guard = self.state();
            let SessionState { store, trigger } = &mut *guard;

            let started = trigger.on_tick(current_time, store);
            let index = active_index(current_time, store.all());
            let snapshot = PlaybackSnapshot {
                current_time,
                bucket: bucket_key(current_time, self.interval),
                active_index: index,
                active: index.map(|i| store.all()[i].clone()),
                generating: trigger.in_flight().map(str::to_string),
                triggered: started.is_some(),
            };
            (snapshot, started)
        };

        let task = started.map(|key| {
            debug!(session = %self.id, bucket = %key, "on-demand generation started");
            let session = Arc::clone(self);
            tokio::spawn(async move { session.generate_bucket(key).await })
        });

        Tick { snapshot, task }
    }

    async fn generate_bucket(&self, key: String) {
        let bucket = self.bucket_for(&key);
        let prior = self
            .state()
            .store
            .titles_before(bucket.start_seconds, PRIOR_CONTEXT_TITLES);

        let record = self.generator.generate_for_bucket(&bucket, &prior).await;

        let mut state = self.state();
        state.store.insert(record);
        state.trigger.complete(&key);
        debug!(session = %self.id, bucket = %key, "on-demand generation stored");
    }

    /// The bucket for `key`; keys past the end of the transcript get an empty one.
    fn bucket_for(&self, key: &str) -> Bucket {
        self.buckets
            .iter()
            .find(|b| b.key == key)
            .cloned()
            .unwrap_or_else(|| {
                let start = parse_timestamp(key);
                Bucket {
                    key: key.to_string(),
                    start_seconds: start,
                    end_seconds: start + u64::from(self.interval.get()),
                    segments: Vec::new(),
                }
            })
    }

    pub fn explanations(&self) -> Vec<ExplanationRecord> {
        self.state().store.all().to_vec()
    }

    pub fn search(&self, query: &str) -> Vec<ExplanationRecord> {
        let state = self.state();
        search(query, state.store.all()).into_iter().cloned().collect()
    }

    pub fn active(&self, current_time: f64) -> Option<ExplanationRecord> {
        active_explanation(current_time, self.state().store.all()).cloned()
    }

    /// Transcript text spoken in the `window` seconds up to `current_time`.
    pub fn recent_transcript(&self, current_time: f64, window: f64) -> String {
        let from = current_time - window;
        let recent: Vec<TranscriptSegment> = self
            .transcript
            .iter()
            .filter(|seg| {
                let start = seg
                    .start_time
                    .unwrap_or_else(|| parse_timestamp(&seg.timestamp) as f64);
                start >= from && start <= current_time
            })
            .cloned()
            .collect();
        concatenate_text(&recent)
    }

    pub fn question_context(&self, current_time: f64) -> QuestionContext {
        let recent = self.recent_transcript(current_time, RECENT_TRANSCRIPT_SECONDS);
        QuestionContext {
            recent_transcript: Some(recent).filter(|t| !t.is_empty()),
            current_explanation: self.active(current_time).map(|e| e.whats_happening),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        reasoning::{MockReasoningService, Prompt},
        segmenter::DEFAULT_INTERVAL_SECONDS,
    };

    fn transcript() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new("0:00", "Let's start"),
            TranscriptSegment::new("0:20", "Now add state"),
            TranscriptSegment::new("0:35", "Render the list"),
        ]
    }

    fn disabled_session() -> Arc<Session> {
        Session::new(
            "9wiWzu_tRB0",
            transcript(),
            DEFAULT_INTERVAL_SECONDS,
            ExplanationGenerator::disabled(),
        )
    }

    #[tokio::test]
    async fn on_demand_seed_covers_first_bucket_only() {
        let session = disabled_session();
        session.seed(GenerationMode::OnDemand).await;

        let keys: Vec<_> = session.explanations().into_iter().map(|e| e.timestamp).collect();
        assert_eq!(keys, ["0:00"]);
    }

    #[tokio::test]
    async fn batch_seed_covers_every_bucket() {
        let session = disabled_session();
        session.seed(GenerationMode::Batch).await;

        let keys: Vec<_> = session.explanations().into_iter().map(|e| e.timestamp).collect();
        assert_eq!(keys, ["0:00", "0:15", "0:30", "0:45"]);
    }

    #[tokio::test]
    async fn tick_generates_entered_bucket() {
        let session = disabled_session();
        session.seed_first_bucket().await;

        let tick = session.tick(21.0);
        assert!(tick.snapshot.triggered);
        assert_eq!(tick.snapshot.bucket, "0:15");
        assert_eq!(tick.snapshot.generating.as_deref(), Some("0:15"));
        assert_eq!(tick.snapshot.active_index, Some(0));
        tick.task.unwrap().await.unwrap();

        let tick = session.tick(22.0);
        assert!(!tick.snapshot.triggered);
        assert!(tick.task.is_none());
        assert_eq!(tick.snapshot.generating, None);
        assert_eq!(tick.snapshot.active_index, Some(1));
        assert_eq!(tick.snapshot.active.unwrap().timestamp, "0:15");
    }

    #[tokio::test]
    async fn busy_session_drops_other_buckets() {
        let mut mock = MockReasoningService::new();
        mock.expect_complete().times(1).returning(|_: &Prompt| {
            Ok(serde_json::json!({
                "title": "State",
                "whyThisMatters": "w",
                "whatsHappening": "h",
                "keyPoint": "k",
            })
            .to_string())
        });
        let session = Session::new(
            "abc",
            transcript(),
            DEFAULT_INTERVAL_SECONDS,
            ExplanationGenerator::new(Arc::new(mock)),
        );

        // The spawned task only runs once awaited on the test's current-thread runtime.
        let first = session.tick(16.0);
        assert!(first.snapshot.triggered);

        let second = session.tick(31.0);
        assert!(!second.snapshot.triggered);
        assert_eq!(second.snapshot.generating.as_deref(), Some("0:15"));

        first.task.unwrap().await.unwrap();
        let keys: Vec<_> = session.explanations().into_iter().map(|e| e.timestamp).collect();
        assert_eq!(keys, ["0:15"]);
    }

    #[tokio::test]
    async fn bucket_past_transcript_end_is_silent() {
        let session = disabled_session();
        let tick = session.tick(600.0);
        tick.task.unwrap().await.unwrap();

        let record = session.active(600.0).unwrap();
        assert_eq!(record.timestamp, "10:00");
        assert_eq!(record.concepts, ["tutorial"]);
    }

    #[tokio::test]
    async fn search_and_question_context() {
        let session = disabled_session();
        session.seed_batch().await;

        assert_eq!(session.search("moment at 0:30").len(), 1);
        assert!(session.search("").is_empty());

        let context = session.question_context(36.0);
        assert_eq!(
            context.recent_transcript.as_deref(),
            Some("Now add state Render the list")
        );
        assert!(context.current_explanation.is_some());
    }
}
