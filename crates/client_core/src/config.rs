use std::{fs, path::Path, str::FromStr, time::Duration};

use serde::Deserialize;
use shared::domain::{EmbeddingModel, LlmModel};
use tracing::warn;

use crate::transport::DEFAULT_REQUEST_TIMEOUT;

pub const DEFAULT_SETTINGS_FILE: &str = "graph_qa.toml";

/// Connection and default-selection settings. The API key is deliberately
/// not part of this: it is typed per session and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub llm_model: LlmModel,
    pub embedding_model: EmbeddingModel,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            llm_model: LlmModel::default(),
            embedding_model: EmbeddingModel::default(),
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
    llm_model: Option<String>,
    embedding_model: Option<String>,
}

/// Defaults, then `path` (or `graph_qa.toml` in the working directory), then
/// environment overrides.
pub fn load_settings(path: Option<&Path>) -> ClientSettings {
    let mut settings = ClientSettings::default();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw, path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "config: could not read settings file"),
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut ClientSettings, raw: &str, path: &Path) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "config: ignoring malformed settings file");
            return;
        }
    };

    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.llm_model.as_deref().and_then(parse_or_warn) {
        settings.llm_model = v;
    }
    if let Some(v) = file_cfg.embedding_model.as_deref().and_then(parse_or_warn) {
        settings.embedding_model = v;
    }
}

fn apply_env(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("GRAPH_QA_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    for key in ["GRAPH_QA_TIMEOUT_SECS", "APP__REQUEST_TIMEOUT_SECS"] {
        if let Some(v) = var(key).as_deref().and_then(parse_or_warn) {
            settings.request_timeout_secs = v;
        }
    }

    if let Some(v) = var("GRAPH_QA_LLM_MODEL").as_deref().and_then(parse_or_warn) {
        settings.llm_model = v;
    }
    if let Some(v) = var("GRAPH_QA_EMBEDDING_MODEL")
        .as_deref()
        .and_then(parse_or_warn)
    {
        settings.embedding_model = v;
    }
}

fn parse_or_warn<T>(raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(value = raw, error = %err, "config: ignoring unparseable value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn file_values_override_defaults() {
        let mut settings = ClientSettings::default();
        apply_file(
            &mut settings,
            r#"
server_url = "http://graph.local:8080/api"
request_timeout_secs = 30
llm_model = "gpt-4o"
embedding_model = "text-embedding-3-large"
"#,
            Path::new("inline.toml"),
        );
        assert_eq!(settings.server_url, "http://graph.local:8080/api");
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.llm_model, LlmModel::Gpt4o);
        assert_eq!(settings.embedding_model, EmbeddingModel::Large3);
    }

    #[test]
    fn unknown_model_in_file_keeps_default() {
        let mut settings = ClientSettings::default();
        apply_file(&mut settings, r#"llm_model = "gpt-9""#, Path::new("inline.toml"));
        assert_eq!(settings.llm_model, LlmModel::Gpt35Turbo);
    }

    #[test]
    fn malformed_file_is_ignored() {
        let mut settings = ClientSettings::default();
        apply_file(&mut settings, "server_url = [", Path::new("inline.toml"));
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn app_prefixed_env_wins_over_short_name() {
        let mut settings = ClientSettings::default();
        apply_env(
            &mut settings,
            env_from(&[
                ("GRAPH_QA_SERVER_URL", "http://one:1"),
                ("APP__SERVER_URL", "http://two:2"),
                ("GRAPH_QA_TIMEOUT_SECS", "not-a-number"),
                ("GRAPH_QA_EMBEDDING_MODEL", "text-embedding-3-small"),
            ]),
        );
        assert_eq!(settings.server_url, "http://two:2");
        assert_eq!(settings.request_timeout_secs, 120);
        assert_eq!(settings.embedding_model, EmbeddingModel::Small3);
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let settings = ClientSettings {
            request_timeout_secs: 0,
            ..ClientSettings::default()
        };
        assert_eq!(settings.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn load_settings_reads_explicit_path() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("graph_qa_settings_test_{suffix}.toml"));
        fs::write(&path, "request_timeout_secs = 45\n").expect("write settings");

        let settings = load_settings(Some(&path));
        if env::var("GRAPH_QA_TIMEOUT_SECS").is_err() && env::var("APP__REQUEST_TIMEOUT_SECS").is_err() {
            assert_eq!(settings.request_timeout_secs, 45);
        }

        fs::remove_file(path).expect("cleanup");
    }
}
