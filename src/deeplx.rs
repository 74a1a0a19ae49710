//! DeepLX翻译后端
//!
//! 通过HTTP调用DeepLX（或dptrans兼容）接口，内置速率限制和重试。

use crate::error::{Result, TranslationError};
use crate::translator::{retry_with_backoff, RateLimiter, Translator};
use crate::types::{DeepLXRequest, DeepLXResponse, RetryConfig, TranslationConfig};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// DeepLX翻译后端
///
/// # 示例
///
/// ```rust,no_run
/// use textbook_translator::{DeepLXTranslator, RetryConfig, TranslationConfig, Translator};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let translator = DeepLXTranslator::new(TranslationConfig::default(), RetryConfig::default());
///     let result = translator.translate_text("Hello, world!").await?;
///     println!("Translation: {}", result);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DeepLXTranslator {
    /// HTTP客户端，用于API调用
    client: Client,
    /// 速率限制器
    rate_limiter: RateLimiter,
    config: TranslationConfig,
    retry: RetryConfig,
}

impl DeepLXTranslator {
    pub fn new(config: TranslationConfig, retry: RetryConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(5)
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent("Mozilla/5.0 (compatible; TextbookTranslator/1.0)")
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Failed to create optimized client: {}, using default", e);
                Client::new()
            });

        Self {
            client,
            rate_limiter: RateLimiter::new(config.max_requests_per_second),
            config,
            retry,
        }
    }

    fn is_dptrans(&self) -> bool {
        self.config.api_url.contains("dptrans")
    }

    async fn send_once(&self, text: &str) -> Result<String> {
        let request = DeepLXRequest {
            text: text.to_string(),
            source_lang: self.config.source_lang.clone(),
            target_lang: self.config.target_lang.clone(),
        };

        let accept = if self.is_dptrans() {
            "application/json, text/plain, */*"
        } else {
            "application/json"
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Accept", accept)
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslationError::Custom(format!("DeepLX request failed: {}", e)))?;

        let status = response.status();
        log::debug!("DeepLX response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_string());
            return Err(TranslationError::ApiError {
                code: status.as_u16() as i32,
                message: format!("DeepLX API request failed: {} - {}", status, error_text),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TranslationError::Custom(format!("Failed to read response body: {}", e)))?;
        parse_response(&body)
    }
}

#[async_trait]
impl Translator for DeepLXTranslator {
    async fn translate_text(&self, text: &str) -> Result<String> {
        log::debug!("Sending {} chars to {}", text.len(), self.config.api_url);
        retry_with_backoff(|| self.send_once(text), &self.retry, &self.rate_limiter).await
    }

    fn name(&self) -> &str {
        if self.is_dptrans() {
            "dptrans"
        } else {
            "deeplx"
        }
    }
}

/// 解析翻译接口的响应体
///
/// 依次尝试标准DeepLX格式 `{code, data}`、带常见字段名的JSON对象，
/// 非JSON响应视为纯文本译文。
pub fn parse_response(body: &str) -> Result<String> {
    if let Ok(result) = serde_json::from_str::<DeepLXResponse>(body) {
        if result.code != 200 {
            return Err(TranslationError::ApiError {
                code: result.code,
                message: format!("DeepLX translation failed with code {}", result.code),
            });
        }
        if result.data.is_empty() {
            return Err(TranslationError::Custom("DeepLX returned an empty translation".to_string()));
        }
        return Ok(result.data);
    }

    if body.trim().is_empty() {
        return Err(TranslationError::Custom("API returned an empty translation".to_string()));
    }

    if body.trim_start().starts_with('{') {
        let json_value = serde_json::from_str::<serde_json::Value>(body)
            .map_err(|_| TranslationError::ParseError(format!("Unable to parse JSON response: {}", body)))?;
        return json_value
            .get("translated_text")
            .or_else(|| json_value.get("result"))
            .or_else(|| json_value.get("translation"))
            .or_else(|| json_value.get("data"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                TranslationError::ParseError(format!("No translation field in JSON response: {}", body))
            });
    }

    Ok(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_response() {
        let text = parse_response(r#"{"code":200,"data":"سلام دنیا"}"#).unwrap();
        assert_eq!(text, "سلام دنیا");
    }

    #[test]
    fn test_parse_error_code() {
        match parse_response(r#"{"code":429,"data":""}"#) {
            Err(TranslationError::ApiError { code, .. }) => assert_eq!(code, 429),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_alternate_json_fields() {
        assert_eq!(parse_response(r#"{"translated_text":"a"}"#).unwrap(), "a");
        assert_eq!(parse_response(r#"{"result":"b"}"#).unwrap(), "b");
        assert!(matches!(
            parse_response(r#"{"other":"c"}"#),
            Err(TranslationError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_plain_text_and_empty() {
        assert_eq!(parse_response("plain translation").unwrap(), "plain translation");
        assert!(parse_response("   ").is_err());
    }

    #[test]
    fn test_backend_name() {
        let mut config = TranslationConfig::default();
        assert_eq!(DeepLXTranslator::new(config.clone(), RetryConfig::default()).name(), "deeplx");
        config.api_url = "https://example.com/dptrans".to_string();
        assert_eq!(DeepLXTranslator::new(config, RetryConfig::default()).name(), "dptrans");
    }
}
