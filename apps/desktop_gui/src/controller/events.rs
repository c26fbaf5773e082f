//! Events sent from the backend worker to the UI thread, and the `UiView`
//! implementation that produces them.

use client_core::{AnswerView, ExplorerPane, GraphImage, Notification, UiView};
use crossbeam_channel::{Sender, TrySendError};
use shared::{domain::Character, protocol::CacheStatus};

pub enum UiEvent {
    BackendReady { server_url: String },
    BackendFailed(String),
    ControlsEnabled(bool),
    Notify(Notification),
    Answer(AnswerView),
    ResultError(String),
    GraphImage(GraphImage),
    ActiveCharacter(Character),
    Explorer(ExplorerPane),
    CacheStatus(CacheStatus),
}

/// Forwards every render call to the UI thread. The UI drains the queue on
/// each frame.
pub struct ChannelView {
    ui_tx: Sender<UiEvent>,
}

impl ChannelView {
    pub fn new(ui_tx: Sender<UiEvent>) -> Self {
        Self { ui_tx }
    }

    /// Controls state must arrive or the form stays locked, so it waits for
    /// queue space. Everything else is dropped when the UI stops draining;
    /// explorer renders happen under the controller's explorer lock.
    fn send(&self, event: UiEvent) {
        let result = if matches!(event, UiEvent::ControlsEnabled(_)) {
            self.ui_tx.send(event).map_err(|_| TrySendError::Disconnected(()))
        } else {
            self.ui_tx.try_send(event).map_err(|err| match err {
                TrySendError::Full(_) => TrySendError::Full(()),
                TrySendError::Disconnected(_) => TrySendError::Disconnected(()),
            })
        };
        match result {
            Ok(()) => {}
            Err(TrySendError::Full(())) => {
                tracing::warn!("ui event queue full; dropping render event");
            }
            Err(TrySendError::Disconnected(())) => {
                tracing::debug!("ui event receiver gone; dropping event");
            }
        }
    }
}

impl UiView for ChannelView {
    fn set_controls_enabled(&self, enabled: bool) {
        self.send(UiEvent::ControlsEnabled(enabled));
    }

    fn notify(&self, notification: Notification) {
        self.send(UiEvent::Notify(notification));
    }

    fn show_answer(&self, answer: AnswerView) {
        self.send(UiEvent::Answer(answer));
    }

    fn show_result_error(&self, message: String) {
        self.send(UiEvent::ResultError(message));
    }

    fn show_graph_image(&self, image: GraphImage) {
        self.send(UiEvent::GraphImage(image));
    }

    fn set_active_character(&self, character: Character) {
        self.send(UiEvent::ActiveCharacter(character));
    }

    fn show_explorer(&self, pane: ExplorerPane) {
        self.send(UiEvent::Explorer(pane));
    }

    fn show_cache_status(&self, status: CacheStatus) {
        self.send(UiEvent::CacheStatus(status));
    }
}
