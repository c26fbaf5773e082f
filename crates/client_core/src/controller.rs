//! Request/response state machine behind the question form, the cache
//! controls, the graph image panel and the character explorer.
//!
//! Control-locking actions (question, cache reset, graph image) go
//! `Idle -> Busy -> {rendered | inline error | notification} -> Idle`; a
//! trigger that arrives while another is in flight is rejected without a
//! request. Explorer selections never block each other: the latest one wins
//! and older responses are discarded.

use std::sync::Arc;

use parking_lot::Mutex;
use shared::domain::{Character, EmbeddingModel, LlmModel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    api::GraphQaApi,
    busy::{ActionKind, Busy, ControlsGate},
    config::ClientSettings,
    error::ClientError,
    notify::{Notification, NotificationLevel},
    session::SessionState,
    transport::RequestBounds,
    view::{AnswerView, ExplorerPane, UiView},
};

pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question.";
pub const CACHE_CLEARED_MESSAGE: &str = "Cache cleared!";
pub const CACHE_CLEAR_FAILED_MESSAGE: &str = "Failed to clear cache.";
const NETWORK_ERROR_RESULT: &str = "Network error. Please try again.";
const NETWORK_ERROR_NOTICE: &str = "Network error.";
const NETWORK_ERROR_GRAPH: &str = "Network error while loading graph.";
const NETWORK_ERROR_EXPLORER: &str = "Network error while loading graph data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyQuestion,
    Busy(ActionKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Succeeded,
    Failed,
    Rejected(RejectReason),
    /// A newer explorer selection replaced this one before it finished.
    Superseded,
    Cancelled,
}

impl ActionOutcome {
    pub fn is_success(self) -> bool {
        self == ActionOutcome::Succeeded
    }
}

struct ExplorerState {
    active: Character,
    generation: u64,
    in_flight: Option<RequestBounds>,
}

pub struct UiController {
    api: Arc<dyn GraphQaApi>,
    view: Arc<dyn UiView>,
    session: Mutex<SessionState>,
    controls: ControlsGate,
    explorer: Mutex<ExplorerState>,
    bounds: RequestBounds,
}

impl UiController {
    pub fn new(api: Arc<dyn GraphQaApi>, view: Arc<dyn UiView>) -> Arc<Self> {
        Self::new_with_settings(api, view, &ClientSettings::default())
    }

    pub fn new_with_settings(
        api: Arc<dyn GraphQaApi>,
        view: Arc<dyn UiView>,
        settings: &ClientSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            controls: ControlsGate::new(view.clone()),
            view,
            session: Mutex::new(SessionState::new(
                settings.llm_model,
                settings.embedding_model,
            )),
            explorer: Mutex::new(ExplorerState {
                active: Character::first(),
                generation: 0,
                in_flight: None,
            }),
            bounds: RequestBounds::new(settings.request_timeout(), CancellationToken::new()),
        })
    }

    /// Initial load: selects the first explorer tab.
    pub async fn start(&self) -> ActionOutcome {
        self.select_character(Character::first()).await
    }

    /// Cancels every in-flight request; nothing further gets rendered.
    pub fn shutdown(&self) {
        info!("controller: shutting down");
        self.bounds.cancel();
    }

    pub fn set_api_key(&self, api_key: impl Into<String>) {
        self.session.lock().set_api_key(api_key);
    }

    pub fn set_llm_model(&self, model: LlmModel) {
        self.session.lock().set_llm_model(model);
    }

    pub fn set_embedding_model(&self, model: EmbeddingModel) {
        self.session.lock().set_embedding_model(model);
    }

    pub fn llm_model(&self) -> LlmModel {
        self.session.lock().llm_model()
    }

    pub fn embedding_model(&self) -> EmbeddingModel {
        self.session.lock().embedding_model()
    }

    pub fn last_question(&self) -> Option<String> {
        self.session.lock().last_question().map(str::to_string)
    }

    pub fn is_busy(&self) -> bool {
        self.controls.is_busy()
    }

    pub fn active_character(&self) -> Character {
        self.explorer.lock().active
    }

    pub async fn submit_question(&self, question: &str) -> ActionOutcome {
        let question = question.trim();
        if question.is_empty() {
            self.view.notify(Notification::new(
                NotificationLevel::Danger,
                EMPTY_QUESTION_MESSAGE,
            ));
            return ActionOutcome::Rejected(RejectReason::EmptyQuestion);
        }

        let _permit = match self.controls.try_acquire(ActionKind::Question) {
            Ok(permit) => permit,
            Err(busy) => return reject_busy(ActionKind::Question, busy),
        };

        let request = self.session.lock().question_request(question);
        info!(
            llm_model = %request.llm_model,
            embedding_model = %request.embedding_model,
            has_api_key = !request.api_key.trim().is_empty(),
            "question: submitting"
        );

        match self.bounds.run(self.api.ask(&request)).await {
            Ok(answer) => {
                info!(
                    cost_usd = ?answer.cost_usd,
                    model_used = answer.model_used.as_deref().unwrap_or("unknown"),
                    "question: answered"
                );
                self.view.show_answer(AnswerView::from(answer));
                ActionOutcome::Succeeded
            }
            Err(ClientError::Cancelled) => ActionOutcome::Cancelled,
            Err(err) if err.is_missing_api_key() => {
                warn!("question: backend has no API key to use");
                self.view
                    .notify(Notification::new(NotificationLevel::Warning, err.to_string()));
                ActionOutcome::Failed
            }
            Err(err) => {
                warn!(error = %err, "question: request failed");
                self.view.show_result_error(result_error_message(&err));
                ActionOutcome::Failed
            }
        }
    }

    pub async fn reset_cache(&self) -> ActionOutcome {
        let _permit = match self.controls.try_acquire(ActionKind::ResetCache) {
            Ok(permit) => permit,
            Err(busy) => return reject_busy(ActionKind::ResetCache, busy),
        };

        match self.bounds.run(self.api.reset_cache()).await {
            Ok(()) => {
                info!("cache: cleared");
                self.view.notify(Notification::new(
                    NotificationLevel::Success,
                    CACHE_CLEARED_MESSAGE,
                ));
                ActionOutcome::Succeeded
            }
            Err(ClientError::Cancelled) => ActionOutcome::Cancelled,
            Err(err) => {
                warn!(error = %err, "cache: reset failed");
                let message = if err.is_transport() {
                    NETWORK_ERROR_NOTICE
                } else {
                    CACHE_CLEAR_FAILED_MESSAGE
                };
                self.view
                    .notify(Notification::new(NotificationLevel::Danger, message));
                ActionOutcome::Failed
            }
        }
    }

    pub async fn show_graph(&self) -> ActionOutcome {
        let _permit = match self.controls.try_acquire(ActionKind::GraphImage) {
            Ok(permit) => permit,
            Err(busy) => return reject_busy(ActionKind::GraphImage, busy),
        };

        match self.bounds.run(self.api.fetch_graph_image()).await {
            Ok(image) => {
                info!(
                    bytes = image.len(),
                    content_type = image.content_type.as_deref().unwrap_or("unknown"),
                    "graph: image loaded"
                );
                self.view.show_graph_image(image);
                ActionOutcome::Succeeded
            }
            Err(ClientError::Cancelled) => ActionOutcome::Cancelled,
            Err(err) => {
                warn!(error = %err, "graph: image request failed");
                let message = if err.is_transport() {
                    NETWORK_ERROR_GRAPH.to_string()
                } else {
                    format!("Failed to load graph: {err}")
                };
                self.view
                    .notify(Notification::new(NotificationLevel::Danger, message));
                ActionOutcome::Failed
            }
        }
    }

    pub async fn select_character(&self, character: Character) -> ActionOutcome {
        let (generation, bounds) = {
            let mut explorer = self.explorer.lock();
            if let Some(previous) = explorer.in_flight.take() {
                previous.cancel();
            }
            explorer.generation += 1;
            explorer.active = character;
            let bounds = self.bounds.child();
            explorer.in_flight = Some(bounds.clone());
            // Rendered under the lock so a concurrent selection cannot
            // interleave its tab marker with ours.
            self.view.set_active_character(character);
            self.view.show_explorer(ExplorerPane::Loading(character));
            (explorer.generation, bounds)
        };
        debug!(%character, generation, "explorer: loading connections");

        let result = bounds
            .run(self.api.fetch_character_graph(character))
            .await;

        let mut explorer = self.explorer.lock();
        if explorer.generation != generation {
            debug!(%character, generation, "explorer: discarding superseded response");
            return ActionOutcome::Superseded;
        }
        explorer.in_flight = None;

        let (pane, outcome) = match result {
            Ok(graph) => {
                if graph.character != character.name() {
                    warn!(
                        requested = %character,
                        returned = %graph.character,
                        "explorer: backend answered for a different character"
                    );
                }
                info!(%character, connections = graph.connections.len(), "explorer: loaded connections");
                let pane = if graph.connections.is_empty() {
                    ExplorerPane::Empty(character)
                } else {
                    ExplorerPane::Connections {
                        character,
                        connections: graph.connections,
                    }
                };
                (pane, ActionOutcome::Succeeded)
            }
            Err(ClientError::Cancelled) => return ActionOutcome::Cancelled,
            Err(err) => {
                warn!(%character, error = %err, "explorer: request failed");
                let message = if err.is_transport() {
                    NETWORK_ERROR_EXPLORER.to_string()
                } else {
                    format!("Error loading graph data: {err}")
                };
                (ExplorerPane::Error { character, message }, ActionOutcome::Failed)
            }
        };
        self.view.show_explorer(pane);
        outcome
    }

    pub async fn refresh_cache_status(&self) -> ActionOutcome {
        match self.bounds.run(self.api.cache_status()).await {
            Ok(status) => {
                debug!(?status, "cache: status loaded");
                self.view.show_cache_status(status);
                ActionOutcome::Succeeded
            }
            Err(ClientError::Cancelled) => ActionOutcome::Cancelled,
            Err(err) => {
                warn!(error = %err, "cache: status request failed");
                let message = if err.is_transport() {
                    NETWORK_ERROR_NOTICE.to_string()
                } else {
                    format!("Failed to load cache status: {err}")
                };
                self.view
                    .notify(Notification::new(NotificationLevel::Danger, message));
                ActionOutcome::Failed
            }
        }
    }
}

impl Drop for UiController {
    fn drop(&mut self) {
        self.bounds.cancel();
    }
}

fn reject_busy(requested: ActionKind, busy: Busy) -> ActionOutcome {
    debug!(requested = %requested, in_flight = %busy.in_flight, "controls: rejecting trigger while busy");
    ActionOutcome::Rejected(RejectReason::Busy(busy.in_flight))
}

/// Inline result-pane text for a failed question.
pub fn result_error_message(err: &ClientError) -> String {
    match err {
        ClientError::Transport(_) => NETWORK_ERROR_RESULT.to_string(),
        ClientError::Timeout(timeout) => format!(
            "Request timed out after {}s. Please try again.",
            timeout.as_secs()
        ),
        other => format!("Error: {other}"),
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
