//! HTTP contract with the question-answering backend.

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::Character,
    error::ErrorBody,
    protocol::{AnswerResponse, CacheStatus, CharacterGraph, QuestionRequest},
};
use tracing::debug;
use url::Url;

use crate::{
    error::{ClientError, ClientResult},
    graph_image::GraphImage,
};

const UNKNOWN_ERROR: &str = "Unknown error";

#[async_trait]
pub trait GraphQaApi: Send + Sync {
    async fn ask(&self, request: &QuestionRequest) -> ClientResult<AnswerResponse>;
    async fn reset_cache(&self) -> ClientResult<()>;
    async fn fetch_graph_image(&self) -> ClientResult<GraphImage>;
    async fn fetch_character_graph(&self, character: Character) -> ClientResult<CharacterGraph>;
    async fn cache_status(&self) -> ClientResult<CacheStatus>;
}

pub struct HttpGraphQaApi {
    http: Client,
    base_url: Url,
}

impl HttpGraphQaApi {
    pub fn new(server_url: &str) -> ClientResult<Self> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> ClientResult<Self> {
        let mut base_url = Url::parse(server_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let response = Self::check_status(response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| ClientError::Decode(err.to_string()))
    }

    async fn check_status(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await?;
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .map(|body| body.error)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        debug!(status = status.as_u16(), %message, "http: backend returned error");
        Err(ClientError::api(status, message))
    }
}

#[async_trait]
impl GraphQaApi for HttpGraphQaApi {
    async fn ask(&self, request: &QuestionRequest) -> ClientResult<AnswerResponse> {
        let url = self.endpoint(&["question"]);
        debug!(%url, llm_model = %request.llm_model, embedding_model = %request.embedding_model, "http: POST question");
        let response = self.http.post(url).json(request).send().await?;
        Self::read_json(response).await
    }

    async fn reset_cache(&self) -> ClientResult<()> {
        let url = self.endpoint(&["reset-cache"]);
        debug!(%url, "http: POST reset-cache");
        let response = self.http.post(url).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn fetch_graph_image(&self) -> ClientResult<GraphImage> {
        let url = self.endpoint(&["show-graph"]);
        debug!(%url, "http: GET show-graph");
        let response = Self::check_status(self.http.get(url).send().await?).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ClientError::Decode("graph image body was empty".to_string()));
        }
        Ok(GraphImage::new(bytes.to_vec(), content_type))
    }

    async fn fetch_character_graph(&self, character: Character) -> ClientResult<CharacterGraph> {
        let url = self.endpoint(&["graph", character.name()]);
        debug!(%url, %character, "http: GET character graph");
        let response = self.http.get(url).send().await?;
        Self::read_json(response).await
    }

    async fn cache_status(&self) -> ClientResult<CacheStatus> {
        let url = self.endpoint(&["cache-status"]);
        debug!(%url, "http: GET cache-status");
        let response = self.http.get(url).send().await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
