//! The render seam between the controller and whatever front end hosts it.

use std::fmt;

use shared::{
    domain::Character,
    protocol::{AnswerResponse, CacheStatus, Connection, StageStatus},
};

use crate::{graph_image::GraphImage, notify::Notification};

/// Everything the controller can ask a front end to display. Calls arrive
/// from runtime tasks, so implementations forward to their UI thread.
pub trait UiView: Send + Sync {
    fn set_controls_enabled(&self, enabled: bool);
    fn notify(&self, notification: Notification);
    fn show_answer(&self, answer: AnswerView);
    fn show_result_error(&self, message: String);
    fn show_graph_image(&self, image: GraphImage);
    fn set_active_character(&self, character: Character);
    fn show_explorer(&self, pane: ExplorerPane);
    fn show_cache_status(&self, status: CacheStatus);
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerView {
    pub answer: String,
    /// `None` hides the cost line entirely.
    pub cost_line: Option<String>,
    pub cache_lines: Vec<CacheLine>,
    pub model_used: Option<String>,
}

impl From<AnswerResponse> for AnswerView {
    fn from(response: AnswerResponse) -> Self {
        let cost_line = response
            .cost_usd
            .map(|cost| format_cost_line(cost, response.model_used.as_deref()));
        let cache_lines = response
            .build_status
            .as_ref()
            .map(|status| {
                status
                    .stages()
                    .into_iter()
                    .map(|(stage, status)| CacheLine {
                        stage,
                        status: status.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            answer: response.response,
            cost_line,
            cache_lines,
            model_used: response.model_used,
        }
    }
}

pub fn format_cost_line(cost_usd: f64, model_used: Option<&str>) -> String {
    match model_used.filter(|model| !model.is_empty()) {
        Some(model) => format!("Estimated cost: ${cost_usd} USD | Model: {model}"),
        None => format!("Estimated cost: ${cost_usd} USD"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLine {
    pub stage: &'static str,
    pub status: StageStatus,
}

impl fmt::Display for CacheLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerPane {
    Loading(Character),
    Connections {
        character: Character,
        connections: Vec<Connection>,
    },
    Empty(Character),
    Error {
        character: Character,
        message: String,
    },
}

impl ExplorerPane {
    pub fn character(&self) -> Character {
        match self {
            ExplorerPane::Loading(character) | ExplorerPane::Empty(character) => *character,
            ExplorerPane::Connections { character, .. } | ExplorerPane::Error { character, .. } => {
                *character
            }
        }
    }

    /// Notice text for the non-table states.
    pub fn notice(&self) -> Option<String> {
        match self {
            ExplorerPane::Loading(character) => Some(format!("Loading {character}...")),
            ExplorerPane::Empty(character) => Some(format!("No connections found for {character}.")),
            ExplorerPane::Error { message, .. } => Some(message.clone()),
            ExplorerPane::Connections { .. } => None,
        }
    }
}

#[cfg(test)]
pub(crate) use recording::RecordingView;

#[cfg(test)]
mod recording {
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorded {
        control_changes: Vec<bool>,
        notifications: Vec<Notification>,
        answer: Option<AnswerView>,
        result_error: Option<String>,
        graph_images: Vec<GraphImage>,
        active_character: Option<Character>,
        explorer: Vec<ExplorerPane>,
        cache_status: Option<CacheStatus>,
    }

    /// Keeps every call so tests can assert on what a front end would show.
    #[derive(Default)]
    pub(crate) struct RecordingView {
        inner: Mutex<Recorded>,
    }

    impl RecordingView {
        pub fn controls_enabled(&self) -> bool {
            self.inner.lock().control_changes.last().copied().unwrap_or(true)
        }

        pub fn control_changes(&self) -> Vec<bool> {
            self.inner.lock().control_changes.clone()
        }

        pub fn notifications(&self) -> Vec<Notification> {
            self.inner.lock().notifications.clone()
        }

        pub fn answer(&self) -> Option<AnswerView> {
            self.inner.lock().answer.clone()
        }

        pub fn result_error(&self) -> Option<String> {
            self.inner.lock().result_error.clone()
        }

        pub fn graph_images(&self) -> Vec<GraphImage> {
            self.inner.lock().graph_images.clone()
        }

        pub fn active_character(&self) -> Option<Character> {
            self.inner.lock().active_character
        }

        pub fn explorer_history(&self) -> Vec<ExplorerPane> {
            self.inner.lock().explorer.clone()
        }

        pub fn explorer(&self) -> Option<ExplorerPane> {
            self.inner.lock().explorer.last().cloned()
        }

        pub fn cache_status(&self) -> Option<CacheStatus> {
            self.inner.lock().cache_status
        }
    }

    impl UiView for RecordingView {
        fn set_controls_enabled(&self, enabled: bool) {
            self.inner.lock().control_changes.push(enabled);
        }

        fn notify(&self, notification: Notification) {
            self.inner.lock().notifications.push(notification);
        }

        fn show_answer(&self, answer: AnswerView) {
            let mut inner = self.inner.lock();
            inner.result_error = None;
            inner.answer = Some(answer);
        }

        fn show_result_error(&self, message: String) {
            let mut inner = self.inner.lock();
            inner.answer = None;
            inner.result_error = Some(message);
        }

        fn show_graph_image(&self, image: GraphImage) {
            self.inner.lock().graph_images.push(image);
        }

        fn set_active_character(&self, character: Character) {
            self.inner.lock().active_character = Some(character);
        }

        fn show_explorer(&self, pane: ExplorerPane) {
            self.inner.lock().explorer.push(pane);
        }

        fn show_cache_status(&self, status: CacheStatus) {
            self.inner.lock().cache_status = Some(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use shared::protocol::BuildStatus;

    use super::*;

    #[test]
    fn renders_magneto_example() {
        let response = AnswerResponse {
            response: "Magneto is a mutant...".to_string(),
            cost_usd: Some(0.002),
            build_status: Some(BuildStatus {
                graph: StageStatus::Cached,
                triplets: StageStatus::Cached,
                index: StageStatus::Other("rebuilt".to_string()),
            }),
            model_used: Some("gpt-4".to_string()),
        };

        let view = AnswerView::from(response);
        assert_eq!(view.answer, "Magneto is a mutant...");
        assert_eq!(
            view.cost_line.as_deref(),
            Some("Estimated cost: $0.002 USD | Model: gpt-4")
        );
        let lines: Vec<String> = view.cache_lines.iter().map(ToString::to_string).collect();
        assert_eq!(lines, ["Graph: cached", "Triplets: cached", "Index: rebuilt"]);
    }

    #[test]
    fn cost_line_hidden_without_cost() {
        let view = AnswerView::from(AnswerResponse {
            response: "Storm controls weather.".to_string(),
            cost_usd: None,
            build_status: None,
            model_used: Some("gpt-4o".to_string()),
        });
        assert!(view.cost_line.is_none());
        assert!(view.cache_lines.is_empty());
        assert_eq!(view.model_used.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn cost_line_without_model() {
        assert_eq!(format_cost_line(0.00125, None), "Estimated cost: $0.00125 USD");
        assert_eq!(format_cost_line(0.5, Some("")), "Estimated cost: $0.5 USD");
    }

    #[test]
    fn empty_pane_mentions_character() {
        let pane = ExplorerPane::Empty(Character::Magneto);
        assert_eq!(pane.notice().as_deref(), Some("No connections found for Magneto."));
        assert_eq!(pane.character(), Character::Magneto);
    }
}
