//! # Textbook Translator
//!
//! 面向教材内容的Markdown翻译库：翻译自然语言文本，同时保证代码块、行内代码、
//! 链接、图片、标题、强调和列表符号等结构在翻译前后逐字节不变。
//!
//! ## 主要特性
//!
//! - **分块翻译**: 逐行解析为标题、代码、列表、段落等块，只翻译文字块
//! - **占位符翻译**: 把结构片段替换为占位符，整篇一次翻译后再回填
//! - **失败降级**: 单个块或片段翻译失败时替换为错误标记，不影响整篇文档
//! - **可替换后端**: DeepLX、OpenAI兼容接口或本地模拟后端
//! - **配置灵活**: 支持TOML配置文件、环境变量和程序化配置
//!
//! ## 快速开始
//!
//! ```rust
//! use std::sync::Arc;
//! use textbook_translator::{MockTranslator, TranslationConfig, TranslationService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = TranslationService::new(TranslationConfig::default(), Arc::new(MockTranslator::new()));
//!
//!     let markdown = "# Hello\n\n```rust\nfn main() {}\n```";
//!     let translated = service.translate(markdown, true).await;
//!     assert_eq!(translated, "# URDU TRANSLATION: Hello\n\n```rust\nfn main() {}\n```");
//! }
//! ```
//!
//! ## 配置文件支持
//!
//! ```toml
//! [translation]
//! enabled = true
//! source_lang = "en"
//! target_lang = "ur"
//! provider = "deeplx"
//! api_url = "http://localhost:1188/translate"
//! max_requests_per_second = 2.0
//! request_timeout_secs = 30
//! strategy = "blocks"
//! verify_placeholders = true
//!
//! [retry]
//! max_retries = 1
//! ```

pub mod blocks;
pub mod config;
pub mod deeplx;
pub mod error;
pub mod extractor;
pub mod mock;
pub mod openai;
pub mod restorer;
pub mod service;
pub mod translator;
pub mod types;

pub use blocks::{parse, Block, BlockKind};
pub use config::TranslationLibConfig;
pub use deeplx::DeepLXTranslator;
pub use error::{Result, TranslationError};
pub use extractor::{extract, Placeholder, PlaceholderMap, SpanKind};
pub use mock::MockTranslator;
pub use openai::OpenAiTranslator;
pub use restorer::{reconstruct, restore_placeholders};
pub use service::TranslationService;
pub use translator::{
    fallback_marker, invoke, retry_with_backoff, translator_from_config, CancellationToken,
    Invocation, RateLimiter, Translator,
};
pub use types::{
    ProviderKind, RetryConfig, TranslationConfig, TranslationReport, TranslationRequest,
    TranslationResult, TranslationStrategy,
};
