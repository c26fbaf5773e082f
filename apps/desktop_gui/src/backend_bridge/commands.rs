//! Backend commands queued from UI to backend worker.

use shared::domain::{Character, EmbeddingModel, LlmModel};

pub enum BackendCommand {
    SubmitQuestion {
        question: String,
    },
    ResetCache,
    ShowGraph,
    SelectCharacter {
        character: Character,
    },
    RefreshCacheStatus,
    SetApiKey {
        api_key: String,
    },
    SetModels {
        llm_model: LlmModel,
        embedding_model: EmbeddingModel,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::SubmitQuestion { .. } => "submit_question",
            BackendCommand::ResetCache => "reset_cache",
            BackendCommand::ShowGraph => "show_graph",
            BackendCommand::SelectCharacter { .. } => "select_character",
            BackendCommand::RefreshCacheStatus => "refresh_cache_status",
            BackendCommand::SetApiKey { .. } => "set_api_key",
            BackendCommand::SetModels { .. } => "set_models",
        }
    }
}
