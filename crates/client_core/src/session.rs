use std::fmt;

use shared::{
    domain::{EmbeddingModel, LlmModel},
    protocol::QuestionRequest,
};
use zeroize::Zeroize;

/// Per-session input state. The API key only ever lives here, in memory.
pub struct SessionState {
    api_key: String,
    llm_model: LlmModel,
    embedding_model: EmbeddingModel,
    last_question: Option<String>,
}

impl SessionState {
    pub fn new(llm_model: LlmModel, embedding_model: EmbeddingModel) -> Self {
        Self {
            api_key: String::new(),
            llm_model,
            embedding_model,
            last_question: None,
        }
    }

    /// Replaces the key wholesale, as on every keystroke in the key field.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key.zeroize();
        self.api_key = api_key.into();
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn clear_api_key(&mut self) {
        self.api_key.zeroize();
    }

    pub fn set_llm_model(&mut self, model: LlmModel) {
        self.llm_model = model;
    }

    pub fn set_embedding_model(&mut self, model: EmbeddingModel) {
        self.embedding_model = model;
    }

    pub fn llm_model(&self) -> LlmModel {
        self.llm_model
    }

    pub fn embedding_model(&self) -> EmbeddingModel {
        self.embedding_model
    }

    pub fn last_question(&self) -> Option<&str> {
        self.last_question.as_deref()
    }

    /// Builds the request for an already-trimmed question and remembers it.
    pub fn question_request(&mut self, question: &str) -> QuestionRequest {
        self.last_question = Some(question.to_string());
        QuestionRequest {
            question: question.to_string(),
            api_key: self.api_key.clone(),
            llm_model: self.llm_model,
            embedding_model: self.embedding_model,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(LlmModel::default(), EmbeddingModel::default())
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("api_key", &if self.has_api_key() { "<redacted>" } else { "<empty>" })
            .field("llm_model", &self.llm_model)
            .field("embedding_model", &self.embedding_model)
            .field("last_question", &self.last_question)
            .finish()
    }
}
