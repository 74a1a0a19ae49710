//! 错误处理模块
//!
//! 定义翻译库中使用的错误类型。翻译后端的错误只在调用边界内部流动，
//! 编排层会把它们转换成带标记的回退文本，而不是继续向上传播。

use std::time::Duration;
use thiserror::Error;

/// 翻译错误类型
///
/// 包含翻译过程中可能出现的各种错误情况。
#[derive(Debug, Error)]
pub enum TranslationError {
    /// HTTP请求错误
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 自定义错误消息
    #[error("{0}")]
    Custom(String),

    /// 速率限制错误
    #[error("Rate limit error: {0}")]
    RateLimitError(String),

    /// API响应错误
    #[error("API error {code}: {message}")]
    ApiError {
        /// 错误代码
        code: i32,
        /// 错误消息
        message: String,
    },

    /// 解析错误
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 单次调用超时
    #[error("Translation timed out after {0:?}")]
    Timeout(Duration),

    /// 调用被取消
    #[error("Translation cancelled")]
    Cancelled,

    /// 翻译后端不可用（未配置密钥、模型未加载等）
    #[error("Translator unavailable: {0}")]
    Unavailable(String),

    /// 配置文件读写错误
    #[error("Config error: {0}")]
    Config(String),
}

impl From<String> for TranslationError {
    fn from(error: String) -> Self {
        TranslationError::Custom(error)
    }
}

impl From<&str> for TranslationError {
    fn from(error: &str) -> Self {
        TranslationError::Custom(error.to_string())
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::Config(error.to_string())
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::Config(error.to_string())
    }
}

impl From<toml::ser::Error> for TranslationError {
    fn from(error: toml::ser::Error) -> Self {
        TranslationError::Config(error.to_string())
    }
}

/// 翻译结果类型别名
///
/// 简化返回类型，使用 `TranslationError` 作为错误类型。
///
/// # 示例
///
/// ```rust
/// use textbook_translator::{Result, TranslationError};
///
/// fn example_function() -> Result<String> {
///     Err(TranslationError::Unavailable("model not loaded".to_string()))
/// }
///
/// assert!(example_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, TranslationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = TranslationError::ApiError { code: 503, message: "busy".to_string() };
        assert_eq!(err.to_string(), "API error 503: busy");

        let err: TranslationError = "boom".into();
        assert_eq!(err.to_string(), "boom");

        let err = TranslationError::Timeout(Duration::from_secs(2));
        assert_eq!(err.to_string(), "Translation timed out after 2s");
    }
}
