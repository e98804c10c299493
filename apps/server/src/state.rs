use std::{num::NonZeroU32, sync::Arc, time::Duration};

use moka::{notification::RemovalCause, policy::EvictionPolicy, sync::Cache};
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkthrough_core::{
    ChatCompletionsClient, ExplanationGenerator, MetadataClient, Provider, QuestionAnswerer,
    ReasoningError, ReasoningService, Session, TranscriptCascade,
};

use crate::{config::Config, error::ApiError};

/// Bounds on the in-memory session registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: u64,
    /// A session nobody has touched for this long is dropped.
    pub idle_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

fn session_registry(limits: SessionLimits) -> Cache<Uuid, Arc<Session>> {
    Cache::builder()
        .max_capacity(limits.max_sessions)
        .time_to_idle(limits.idle_timeout)
        .eviction_policy(EvictionPolicy::lru())
        .eviction_listener(|id: Arc<Uuid>, _session: Arc<Session>, cause: RemovalCause| {
            if cause.was_evicted() {
                debug!(session = %id, ?cause, "session evicted");
            }
        })
        .build()
}

/// Everything a handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub provider: Provider,
    pub reasoner: Option<Arc<dyn ReasoningService>>,
    pub generator: ExplanationGenerator,
    pub answerer: QuestionAnswerer,
    pub transcripts: Arc<TranscriptCascade>,
    pub metadata: MetadataClient,
    pub default_interval: NonZeroU32,
    sessions: Cache<Uuid, Arc<Session>>,
}

impl AppState {
    pub fn new(
        provider: Provider,
        reasoner: Option<Arc<dyn ReasoningService>>,
        transcripts: TranscriptCascade,
        metadata: MetadataClient,
        default_interval: NonZeroU32,
        limits: SessionLimits,
    ) -> Self {
        Self {
            provider,
            generator: ExplanationGenerator::from_optional(reasoner.clone()),
            answerer: QuestionAnswerer::from_optional(reasoner.clone()),
            reasoner,
            transcripts: Arc::new(transcripts),
            metadata,
            default_interval,
            sessions: session_registry(limits),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let reasoner: Option<Arc<dyn ReasoningService>> = match ChatCompletionsClient::for_provider(
            config.provider,
            config.model.clone(),
            config.request_timeout(),
        ) {
            Ok(client) => {
                info!(provider = config.provider.name(), model = client.model(), "AI explanations enabled");
                Some(Arc::new(client))
            }
            Err(ReasoningError::Provider(e)) => {
                warn!(error = %e, "AI explanations disabled, using fallback content");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self::new(
            config.provider,
            reasoner,
            TranscriptCascade::youtube(client.clone()),
            MetadataClient::new(client, config.youtube_api_key.clone()),
            config.interval_seconds,
            config.session_limits(),
        ))
    }

    pub fn has_ai(&self) -> bool {
        self.reasoner.is_some()
    }

    pub fn insert_session(&self, session: Arc<Session>) {
        self.sessions.insert(session.id(), session);
    }

    /// Looking a session up counts as activity and resets its idle timer.
    pub fn session(&self, id: Uuid) -> Result<Arc<Session>, ApiError> {
        self.sessions.get(&id).ok_or(ApiError::SessionNotFound(id))
    }

    pub fn remove_session(&self, id: Uuid) -> Result<Arc<Session>, ApiError> {
        self.sessions.remove(&id).ok_or(ApiError::SessionNotFound(id))
    }

    /// Live sessions, after applying any pending evictions.
    pub fn session_count(&self) -> u64 {
        self.sessions.run_pending_tasks();
        self.sessions.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use walkthrough_core::{DEFAULT_INTERVAL_SECONDS, TranscriptSegment};

    use super::*;

    fn state(limits: SessionLimits) -> AppState {
        AppState::new(
            Provider::Openai,
            None,
            TranscriptCascade::new(Vec::new()),
            MetadataClient::new(reqwest::Client::new(), None),
            DEFAULT_INTERVAL_SECONDS,
            limits,
        )
    }

    fn new_session() -> Arc<Session> {
        Session::new(
            "9wiWzu_tRB0",
            vec![TranscriptSegment::new("0:00", "Let's start")],
            DEFAULT_INTERVAL_SECONDS,
            ExplanationGenerator::disabled(),
        )
    }

    #[test]
    fn idle_sessions_expire() {
        let state = state(SessionLimits {
            max_sessions: 10,
            idle_timeout: Duration::from_millis(50),
        });
        let session = new_session();
        state.insert_session(session.clone());
        assert!(state.session(session.id()).is_ok());

        std::thread::sleep(Duration::from_millis(150));
        assert!(matches!(
            state.session(session.id()),
            Err(ApiError::SessionNotFound(id)) if id == session.id()
        ));
    }

    #[test]
    fn registry_is_bounded() {
        let state = state(SessionLimits {
            max_sessions: 2,
            idle_timeout: Duration::from_secs(60),
        });
        let sessions: Vec<_> = (0..20).map(|_| new_session()).collect();
        for session in &sessions {
            state.insert_session(session.clone());
        }

        assert!(state.session_count() <= 2);
        let alive = sessions
            .iter()
            .filter(|s| state.session(s.id()).is_ok())
            .count();
        assert!(alive <= 2, "alive = {}", alive);
        assert!(state.session(sessions[19].id()).is_ok());
    }

    #[test]
    fn removed_sessions_are_not_found() {
        let state = state(SessionLimits::default());
        let session = new_session();
        state.insert_session(session.clone());

        assert!(state.remove_session(session.id()).is_ok());
        assert!(state.session(session.id()).is_err());
        assert!(state.remove_session(session.id()).is_err());
    }
}
