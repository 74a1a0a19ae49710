//! OpenAI兼容的LLM翻译后端
//!
//! 使用 chat completions 接口翻译文本。系统提示要求模型原样保留
//! `[PLACEHOLDER_...]` 记号，只输出译文。

use crate::error::{Result, TranslationError};
use crate::translator::{retry_with_backoff, RateLimiter, Translator};
use crate::types::{RetryConfig, TranslationConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// OpenAI兼容后端
pub struct OpenAiTranslator {
    client: Client,
    rate_limiter: RateLimiter,
    endpoint: String,
    api_key: String,
    config: TranslationConfig,
    retry: RetryConfig,
}

impl OpenAiTranslator {
    /// 创建后端，缺少 `api_key` 时返回 [`TranslationError::Unavailable`]
    pub fn new(config: TranslationConfig, retry: RetryConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TranslationError::Unavailable("OpenAI API key is not configured".to_string()))?;

        // 默认配置指向本地DeepLX，换成OpenAI时使用官方地址
        let endpoint = if config.api_url.contains("chat/completions") {
            config.api_url.clone()
        } else {
            DEFAULT_OPENAI_URL.to_string()
        };

        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(config.max_requests_per_second),
            endpoint,
            api_key,
            config,
            retry,
        })
    }

    fn system_prompt(&self) -> String {
        system_prompt(&self.config.source_lang, &self.config.target_lang)
    }

    async fn complete_once(&self, text: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: text.to_string(),
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslationError::ApiError {
                code: status.as_u16() as i32,
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::ParseError(e.to_string()))?;
        extract_content(body)
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate_text(&self, text: &str) -> Result<String> {
        retry_with_backoff(|| self.complete_once(text), &self.retry, &self.rate_limiter).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

fn system_prompt(source_lang: &str, target_lang: &str) -> String {
    format!(
        "You are a professional translator. Translate the user's text from {} to {}. \
         Keep every token of the form [PLACEHOLDER_...] exactly as written. \
         Keep line breaks. Output only the translation.",
        source_lang, target_lang
    )
}

fn extract_content(body: ChatResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| TranslationError::ParseError("Chat completion returned no content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_unavailable() {
        let config = TranslationConfig::default();
        assert!(matches!(
            OpenAiTranslator::new(config, RetryConfig::default()),
            Err(TranslationError::Unavailable(_))
        ));
    }

    #[test]
    fn test_endpoint_selection() {
        let mut config = TranslationConfig::default();
        config.api_key = Some("sk-test".to_string());
        let translator = OpenAiTranslator::new(config.clone(), RetryConfig::default()).unwrap();
        assert_eq!(translator.endpoint, DEFAULT_OPENAI_URL);

        config.api_url = "http://localhost:8080/v1/chat/completions".to_string();
        let translator = OpenAiTranslator::new(config, RetryConfig::default()).unwrap();
        assert_eq!(translator.endpoint, "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_extract_content() {
        let body: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"ترجمہ"}}]}"#).unwrap();
        assert_eq!(extract_content(body).unwrap(), "ترجمہ");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(extract_content(empty).is_err());
    }

    #[test]
    fn test_prompt_names_languages() {
        let prompt = system_prompt("en", "ur");
        assert!(prompt.contains("from en to ur"));
        assert!(prompt.contains("[PLACEHOLDER_...]"));
    }
}
