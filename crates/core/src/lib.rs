pub mod analysis;
pub mod assistant;
pub mod error;
pub mod format;
pub mod generator;
pub mod provider;
pub mod reasoning;
pub mod search;
pub mod segmenter;
pub mod session;
pub mod store;
pub mod sync;
pub mod transcript;
pub mod trigger;
pub mod types;

pub use analysis::{generate_explanations, generate_explanations_with_progress};
pub use assistant::{QuestionAnswerer, QuestionContext};
pub use error::{MetadataError, ReasoningError, TranscriptError};
pub use format::{format_explanations_readable, format_timestamp, parse_timestamp};
pub use generator::ExplanationGenerator;
pub use provider::{Provider, ProviderConfig, ProviderError};
pub use reasoning::{ChatCompletionsClient, Prompt, ReasoningService};
pub use segmenter::{Bucket, DEFAULT_INTERVAL_SECONDS, segment_transcript};
pub use session::{GenerationMode, PlaybackSnapshot, Session};
pub use store::ExplanationStore;
pub use sync::active_index;
pub use transcript::{
    FetchedTranscript, MetadataClient, TranscriptCascade, TranscriptSource, extract_video_id,
};
pub use types::{ExplanationRecord, TranscriptSegment, VideoMetadata};
