use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{EmbeddingModel, LlmModel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    /// Sent even when empty; the backend may fall back to its own key.
    pub api_key: String,
    pub llm_model: LlmModel,
    pub embedding_model: EmbeddingModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_status: Option<BuildStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

/// Cache state the backend reports for each pipeline stage of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatus {
    #[serde(default)]
    pub graph: StageStatus,
    #[serde(default)]
    pub triplets: StageStatus,
    #[serde(default)]
    pub index: StageStatus,
}

impl BuildStatus {
    pub fn stages(&self) -> [(&'static str, &StageStatus); 3] {
        [
            ("Graph", &self.graph),
            ("Triplets", &self.triplets),
            ("Index", &self.index),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StageStatus {
    Cached,
    Other(String),
}

impl StageStatus {
    pub fn is_cached(&self) -> bool {
        matches!(self, StageStatus::Cached)
    }

    pub fn label(&self) -> &str {
        match self {
            StageStatus::Cached => "cached",
            StageStatus::Other(label) => label,
        }
    }
}

impl Default for StageStatus {
    fn default() -> Self {
        StageStatus::Other("unknown".to_string())
    }
}

impl From<String> for StageStatus {
    fn from(value: String) -> Self {
        if value == "cached" {
            StageStatus::Cached
        } else {
            StageStatus::Other(value)
        }
    }
}

impl From<StageStatus> for String {
    fn from(value: StageStatus) -> Self {
        match value {
            StageStatus::Cached => "cached".to_string(),
            StageStatus::Other(label) => label,
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub relation: String,
    pub entity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterGraph {
    pub character: String,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// Which backend build artifacts currently exist on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatus {
    #[serde(default)]
    pub graph: bool,
    #[serde(default)]
    pub triplets: bool,
    #[serde(default)]
    pub index: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_decodes_with_optional_fields_missing() {
        let answer: AnswerResponse =
            serde_json::from_str(r#"{"response":"Logan heals."}"#).expect("decode");
        assert_eq!(answer.response, "Logan heals.");
        assert!(answer.cost_usd.is_none());
        assert!(answer.build_status.is_none());
        assert!(answer.model_used.is_none());
    }

    #[test]
    fn answer_decodes_null_cost_as_absent() {
        let answer: AnswerResponse =
            serde_json::from_str(r#"{"response":"x","cost_usd":null}"#).expect("decode");
        assert!(answer.cost_usd.is_none());
    }

    #[test]
    fn stage_status_keeps_non_cached_labels() {
        let status: BuildStatus =
            serde_json::from_str(r#"{"graph":"cached","triplets":"rebuilt"}"#).expect("decode");
        assert!(status.graph.is_cached());
        assert_eq!(status.triplets, StageStatus::Other("rebuilt".to_string()));
        assert_eq!(status.index.label(), "unknown");
    }

    #[test]
    fn question_request_uses_wire_model_names() {
        let request = QuestionRequest {
            question: "Who is Magneto?".to_string(),
            api_key: String::new(),
            llm_model: LlmModel::Gpt4,
            embedding_model: EmbeddingModel::Small3,
        };
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value["llm_model"], "gpt-4");
        assert_eq!(value["embedding_model"], "text-embedding-3-small");
        assert_eq!(value["api_key"], "");
    }

    #[test]
    fn character_graph_defaults_to_no_connections() {
        let graph: CharacterGraph =
            serde_json::from_str(r#"{"character":"Beast"}"#).expect("decode");
        assert!(graph.connections.is_empty());
    }
}
