use std::num::NonZeroU32;

use tracing::info;

use crate::{
    generator::{ExplanationGenerator, PRIOR_CONTEXT_TITLES},
    segmenter::{Bucket, segment_transcript},
    store::ExplanationStore,
    types::{ExplanationRecord, TranscriptSegment},
};

/// Batch mode: explain every bucket of the transcript, in order.
pub async fn generate_explanations(
    generator: &ExplanationGenerator,
    transcript: &[TranscriptSegment],
    interval: NonZeroU32,
) -> Vec<ExplanationRecord> {
    generate_explanations_with_progress(generator, transcript, interval, |_, _, _| {}).await
}

/// Same as [`generate_explanations`], reporting `(done, total, record)` after each bucket.
pub async fn generate_explanations_with_progress<F>(
    generator: &ExplanationGenerator,
    transcript: &[TranscriptSegment],
    interval: NonZeroU32,
    mut on_progress: F,
) -> Vec<ExplanationRecord>
where
    F: FnMut(usize, usize, &ExplanationRecord),
{
    let buckets = segment_transcript(transcript, interval);
    info!(
        buckets = buckets.len(),
        interval = interval.get(),
        ai = generator.is_enabled(),
        "generating explanations"
    );

    let mut store = ExplanationStore::new();
    fill_buckets(generator, &buckets, &mut store, &mut on_progress).await;
    store.into_vec()
}

/// Sequentially generate the buckets missing from `store`, each one seeing the
/// titles of the last records before it.
async fn fill_buckets<F>(
    generator: &ExplanationGenerator,
    buckets: &[Bucket],
    store: &mut ExplanationStore,
    on_progress: &mut F,
) where
    F: FnMut(usize, usize, &ExplanationRecord),
{
    let total = buckets.len();
    for (i, bucket) in buckets.iter().enumerate() {
        if store.contains(&bucket.key) {
            continue;
        }
        let prior = store.titles_before(bucket.start_seconds, PRIOR_CONTEXT_TITLES);
        let record = generator.generate_for_bucket(bucket, &prior).await;
        on_progress(i + 1, total, &record);
        store.insert(record);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        reasoning::{MockReasoningService, Prompt},
        segmenter::DEFAULT_INTERVAL_SECONDS,
    };

    fn transcript() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new("0:00", "Let's start"),
            TranscriptSegment::new("0:20", "Now add state"),
        ]
    }

    #[tokio::test]
    async fn disabled_generator_yields_one_placeholder_per_bucket() {
        let records = generate_explanations(
            &ExplanationGenerator::disabled(),
            &transcript(),
            DEFAULT_INTERVAL_SECONDS,
        )
        .await;

        let keys: Vec<_> = records.iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(keys, ["0:00", "0:15", "0:30"]);
        for record in &records {
            assert!(record.title.contains(&record.timestamp));
        }
        assert!(records[0].why_this_matters.contains("Let's start"));
        assert!(records[1].why_this_matters.contains("Now add state"));
        assert!(records[2].why_this_matters.contains("Continuing from: Moment at 0:15"));
    }

    #[tokio::test]
    async fn empty_transcript_yields_single_bucket() {
        let records = generate_explanations(
            &ExplanationGenerator::disabled(),
            &[],
            DEFAULT_INTERVAL_SECONDS,
        )
        .await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, "0:00");
    }

    #[tokio::test]
    async fn prior_titles_are_fed_forward() {
        let transcript = vec![
            TranscriptSegment::new("0:00", "one"),
            TranscriptSegment::new("0:15", "two"),
            TranscriptSegment::new("0:30", "three"),
            TranscriptSegment::new("0:50", "four"),
        ];
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen_in_mock = seen.clone();

        let mut mock = MockReasoningService::new();
        mock.expect_complete().returning(move |prompt: &Prompt| {
            seen_in_mock.lock().unwrap().push(prompt.user.clone());
            let n = seen_in_mock.lock().unwrap().len();
            Ok(serde_json::json!({
                "title": format!("Step {}", n),
                "whyThisMatters": "w",
                "whatsHappening": "h",
                "keyPoint": "k",
            })
            .to_string())
        });
        let generator = ExplanationGenerator::new(Arc::new(mock));

        let mut progress = Vec::new();
        let records = generate_explanations_with_progress(
            &generator,
            &transcript,
            DEFAULT_INTERVAL_SECONDS,
            |done, total, _| progress.push((done, total)),
        )
        .await;

        // Four spoken buckets plus the trailing silent 1:00 bucket.
        assert_eq!(records.len(), 5);
        assert_eq!(progress.last(), Some(&(5, 5)));

        let prompts = seen.lock().unwrap();
        assert_eq!(prompts.len(), 4);
        assert!(!prompts[0].contains("Previous topics covered"));
        assert!(prompts[1].contains("Previous topics covered: Step 1"));
        assert!(prompts[3].contains("Previous topics covered: Step 2, Step 3"));
        assert!(records[4].why_this_matters.contains("Continuing from: Step 4"));
    }
}
