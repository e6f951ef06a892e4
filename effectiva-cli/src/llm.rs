use anyhow::{Context, Result, bail};
use effectiva_core::context::{ChatTurn, Role};
use effectiva_core::{CompletionBackend, HeuristicClassifier, IntentClassifier, IntentPrediction, ModelClassifier};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Config, IntentBackend, LlmSection};

const ANTHROPIC_URL: &str = "https://api.anthropic.com";
const OPENAI_URL: &str = "https://api.openai.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAI),
            other => bail!("unknown llm provider {other:?}; use openai or anthropic"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    provider: Provider,
    model: String,
    base_url: String,
    temperature: f32,
    api_key: String,
}

impl LlmClient {
    pub fn from_config(cfg: &LlmSection) -> Result<Self> {
        let provider = Provider::parse(&cfg.provider)?;
        let api_key = std::env::var(&cfg.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .with_context(|| format!("{} is not set; export your API key or change llm.api_key_env", cfg.api_key_env))?;
        // The default base_url targets OpenAI; don't send Anthropic traffic there.
        let base_url = match (provider, cfg.base_url.trim_end_matches('/')) {
            (Provider::Anthropic, OPENAI_URL) | (Provider::Anthropic, "") => ANTHROPIC_URL.to_string(),
            (Provider::OpenAI, "") => OPENAI_URL.to_string(),
            (_, url) => url.to_string(),
        };
        Ok(Self {
            provider,
            model: cfg.model.clone(),
            base_url,
            temperature: cfg.temperature,
            api_key,
        })
    }

    pub fn chat(&self, system: &str, turns: &[ChatTurn]) -> Result<String> {
        // main runs under #[tokio::main]; a nested block_on would panic.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.chat_async(system, turns)))
        } else {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(self.chat_async(system, turns))
        }
    }

    async fn chat_async(&self, system: &str, turns: &[ChatTurn]) -> Result<String> {
        debug!(provider = ?self.provider, model = self.model.as_str(), turns = turns.len(), "llm request");
        match self.provider {
            Provider::Anthropic => self.anthropic_complete(system, turns).await,
            Provider::OpenAI => self.openai_complete(system, turns).await,
        }
    }

    async fn anthropic_complete(&self, system: &str, turns: &[ChatTurn]) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: i32,
            temperature: f32,
            system: String,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        // Anthropic takes system text out of band; fold summary turns into it.
        let mut system = system.to_string();
        for t in turns.iter().filter(|t| t.role == Role::System) {
            system.push_str("\n\n");
            system.push_str(&t.content);
        }
        let messages = turns
            .iter()
            .filter(|t| t.role != Role::System)
            .map(|t| Msg {
                role: t.role.as_str(),
                content: &t.content,
            })
            .collect();

        let body = Req {
            model: &self.model,
            max_tokens: 800,
            temperature: self.temperature,
            system,
            messages,
        };

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = reqwest::Client::new()
            .post(format!("{}/v1/messages", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("anthropic request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("anthropic error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse anthropic response")?;
        let text: String = out
            .content
            .into_iter()
            .filter(|b| b.t == "text")
            .filter_map(|b| b.text)
            .collect();
        Ok(text.trim().to_string())
    }

    async fn openai_complete(&self, system: &str, turns: &[ChatTurn]) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let mut messages = vec![Msg {
            role: "system",
            content: system,
        }];
        messages.extend(turns.iter().map(|t| Msg {
            role: t.role.as_str(),
            content: &t.content,
        }));

        let body = Req {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let resp = reqwest::Client::new()
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("openai error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse openai response")?;
        let content = out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(content.trim().to_string())
    }
}

impl CompletionBackend for LlmClient {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.chat(system, &[ChatTurn::user(user)])
    }
}

/// The intent classifier the config asks for.
pub enum Classifier {
    Heuristic(HeuristicClassifier),
    Model(ModelClassifier<LlmClient>),
}

impl Classifier {
    /// Falls back to the heuristic when the model backend can't be built.
    pub fn from_config(cfg: &Config) -> Self {
        if cfg.intent.backend == IntentBackend::Heuristic {
            return Classifier::Heuristic(HeuristicClassifier);
        }
        match LlmClient::from_config(&cfg.llm) {
            Ok(client) => Classifier::Model(ModelClassifier::new(client)),
            Err(e) => {
                warn!(error = %e, "model intent backend unavailable, using heuristic");
                Classifier::Heuristic(HeuristicClassifier)
            }
        }
    }
}

impl IntentClassifier for Classifier {
    fn classify(&self, message: &str) -> IntentPrediction {
        match self {
            Classifier::Heuristic(c) => c.classify(message),
            Classifier::Model(c) => c.classify(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names() {
        assert_eq!(Provider::parse("OpenAI").unwrap(), Provider::OpenAI);
        assert_eq!(Provider::parse("claude").unwrap(), Provider::Anthropic);
        assert!(Provider::parse("gemini").is_err());
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let cfg = LlmSection {
            api_key_env: "EFFECTIVA_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmSection::default()
        };
        let err = LlmClient::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("EFFECTIVA_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_model_backend_without_key_falls_back() {
        let mut cfg = Config::default();
        cfg.intent.backend = IntentBackend::Model;
        cfg.llm.api_key_env = "EFFECTIVA_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        let c = Classifier::from_config(&cfg);
        assert!(matches!(c, Classifier::Heuristic(_)));
        assert_eq!(c.classify("lab record due").intent, effectiva_core::Intent::BcaLab);
    }
}
