//! Application state and the operations the endpoints delegate to.

use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;
use crate::gemini::{GeminiClient, GeminiError};
use crate::impact::{estimate_exchange_tokens, estimate_question_tokens};
use crate::session::{AskReport, CookieSigner, Exchange, ResetReport, SessionStore, StatsSnapshot};

/// Everything a request handler needs, shared behind one `Arc`. Handlers
/// stay thin; the tracker logic lives here.
pub struct AppState {
    pub config: Config,
    gemini: GeminiClient,
    sessions: SessionStore,
    signer: CookieSigner,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, GeminiError> {
        let gemini = GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
        )?;
        let signer = CookieSigner::new(&config.secret_key);
        Ok(Self {
            config,
            gemini,
            sessions: SessionStore::new(),
            signer,
        })
    }

    pub fn signer(&self) -> &CookieSigner {
        &self.signer
    }

    /// The whole ask flow: validate, pre-check, call the service, account
    /// for tokens, commit. The session lock is never held across the
    /// external call, so the pre-check acts on a possibly-stale total; that
    /// is inherent to gating before the true cost is known.
    pub async fn ask(&self, session_id: Uuid, question: &str) -> Result<AskReport, ApiError> {
        if question.is_empty() {
            return Err(ApiError::InvalidInput("No question provided".to_string()));
        }

        let capacity = self.config.bathtub_capacity;
        let estimate = estimate_question_tokens(question, self.config.estimate_words_factor);
        let current = self.sessions.total_tokens(session_id).await;
        if current as f64 + estimate > capacity as f64 {
            tracing::info!(
                session = %session_id,
                current_tokens = current,
                estimated_tokens = estimate,
                "pre-check rejected question"
            );
            return Err(ApiError::WouldOverflow);
        }

        let completion = self.gemini.generate_content(question).await?;

        let tokens_used = match completion.usage {
            Some(usage) => usage.charged_tokens(),
            None => {
                let estimated = estimate_exchange_tokens(
                    question,
                    &completion.text,
                    self.config.estimate_chars_per_token,
                );
                tracing::debug!(tokens = estimated, "no usage metadata, estimated from length");
                estimated
            }
        };

        let report = self
            .sessions
            .record_exchange(
                session_id,
                question.to_string(),
                completion.text,
                tokens_used,
                self.config.factors,
                capacity,
            )
            .await;

        tracing::info!(
            session = %session_id,
            tokens = report.tokens_used,
            total_tokens = report.total_tokens,
            water_level = report.water_level_percentage,
            "exchange recorded"
        );
        if report.overflowed {
            tracing::warn!(
                session = %session_id,
                total_tokens = report.total_tokens,
                capacity,
                "bathtub overflowed"
            );
        }

        Ok(report)
    }

    pub async fn ensure_session(&self, session_id: Uuid) {
        self.sessions.ensure(session_id).await;
    }

    pub async fn reset(&self, session_id: Uuid) -> ResetReport {
        self.sessions.reset(session_id).await
    }

    pub async fn stats(&self, session_id: Uuid) -> StatsSnapshot {
        self.sessions
            .snapshot(session_id, self.config.bathtub_capacity)
            .await
    }

    pub async fn history(&self, session_id: Uuid) -> Vec<Exchange> {
        self.sessions.history(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impact::ImpactFactors;

    /// State whose Gemini base URL points nowhere; only paths that fail
    /// before the external call may be exercised.
    fn offline_state(capacity: u64) -> AppState {
        AppState::new(Config {
            gemini_api_key: "test-key".to_string(),
            gemini_model: "gemini-1.5-pro".to_string(),
            gemini_base_url: "http://127.0.0.1:1".to_string(),
            secret_key: "test-secret".to_string(),
            port: 0,
            bathtub_capacity: capacity,
            factors: ImpactFactors::default(),
            estimate_words_factor: 1.5,
            estimate_chars_per_token: 4.0,
        })
        .expect("state")
    }

    #[tokio::test]
    async fn empty_question_is_rejected_before_the_call() {
        let state = offline_state(10_000);
        let err = state.ask(Uuid::new_v4(), "").await.expect_err("should fail");
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(err.to_string(), "No question provided");
    }

    #[tokio::test]
    async fn precheck_trips_before_the_call() {
        // Capacity 2 means even a one-word question (estimate 1.5) plus a
        // single consumed token crosses the line.
        let state = offline_state(2);
        let id = Uuid::new_v4();
        let twenty_words = vec!["word"; 20].join(" ");

        let err = state.ask(id, &twenty_words).await.expect_err("should fail");
        assert!(matches!(err, ApiError::WouldOverflow));
        assert_eq!(state.stats(id).await.total_tokens, 0);
        assert!(state.history(id).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_service_surfaces_as_service_error() {
        let state = offline_state(10_000);
        let id = Uuid::new_v4();
        let err = state.ask(id, "hello").await.expect_err("should fail");
        assert!(matches!(err, ApiError::Service(_)));
        // no partial mutation
        assert_eq!(state.stats(id).await.total_tokens, 0);
    }
}
