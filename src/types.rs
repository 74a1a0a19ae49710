//! 类型定义模块
//!
//! 定义翻译库中使用的所有数据结构和配置类型。

use serde::{Deserialize, Serialize};

/// 保留格式时使用的翻译策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStrategy {
    /// 按块逐个翻译，占位符语法永远不会发送给翻译后端
    Blocks,
    /// 整篇文档一次翻译，结构化片段由占位符保护
    Placeholders,
    /// 不保留格式，整篇原文作为不透明文本翻译
    Raw,
}

impl Default for TranslationStrategy {
    fn default() -> Self {
        TranslationStrategy::Blocks
    }
}

/// 翻译后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// DeepLX 或 dptrans 兼容接口
    #[serde(rename = "deeplx")]
    DeepLX,
    /// OpenAI 兼容的 chat completions 接口
    #[serde(rename = "openai")]
    OpenAi,
    /// 本地模拟翻译，只给文本加前缀
    Mock,
}

impl Default for ProviderKind {
    fn default() -> Self {
        ProviderKind::DeepLX
    }
}

/// 翻译配置
///
/// 包含翻译服务的所有配置选项，如API地址、语言设置、性能参数等。
///
/// # 字段说明
///
/// * `enabled` - 是否启用翻译功能，关闭时原样返回输入
/// * `source_lang` - 源语言代码，"auto"表示自动检测
/// * `target_lang` - 目标语言代码
/// * `provider` - 翻译后端类型
/// * `api_url` - 翻译后端地址
/// * `api_key` - 后端密钥（OpenAI需要）
/// * `model` - LLM模型名称
/// * `max_requests_per_second` - 每秒最大请求数
/// * `request_timeout_secs` - 单次调用的超时时间
/// * `strategy` - 保留格式时的默认策略
/// * `verify_placeholders` - 占位符策略下校验占位符是否完整返回
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// 是否启用翻译功能
    pub enabled: bool,
    /// 源语言代码
    pub source_lang: String,
    /// 目标语言代码
    pub target_lang: String,
    /// 翻译后端类型
    pub provider: ProviderKind,
    /// 翻译后端地址
    pub api_url: String,
    /// 后端密钥
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// LLM模型名称
    pub model: String,
    /// 每秒最大请求数
    pub max_requests_per_second: f64,
    /// 单次调用超时（秒）
    pub request_timeout_secs: u64,
    /// 保留格式时的默认策略
    pub strategy: TranslationStrategy,
    /// 校验占位符是否原样返回
    pub verify_placeholders: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source_lang: "en".to_string(),
            target_lang: "ur".to_string(),
            provider: ProviderKind::default(),
            api_url: "http://localhost:1188/translate".to_string(),
            api_key: None,
            model: "gpt-4".to_string(),
            max_requests_per_second: 2.0,
            request_timeout_secs: 30,
            strategy: TranslationStrategy::default(),
            verify_placeholders: true,
        }
    }
}

impl TranslationConfig {
    /// 单次调用的超时时长
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_delay_ms: 100,
            max_delay_ms: 1000,
            backoff_multiplier: 1.2,
        }
    }
}

/// 调用方提交的翻译请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub content: String,
    #[serde(default = "default_preserve_formatting")]
    pub preserve_formatting: bool,
}

fn default_preserve_formatting() -> bool {
    true
}

impl TranslationRequest {
    pub fn new(content: impl Into<String>, preserve_formatting: bool) -> Self {
        Self {
            content: content.into(),
            preserve_formatting,
        }
    }
}

/// 返回给调用方的翻译结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated_content: String,
}

/// 一次文档翻译的详细结果
///
/// `units` 是实际交给翻译后端的单元数（整篇文档或可翻译块），
/// `failed_units` 是被替换为错误标记的单元数。
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationReport {
    pub translated_content: String,
    pub strategy: TranslationStrategy,
    pub units: usize,
    pub failed_units: usize,
    pub cancelled: bool,
}

impl TranslationReport {
    pub(crate) fn unchanged(content: &str, strategy: TranslationStrategy) -> Self {
        Self {
            translated_content: content.to_string(),
            strategy,
            units: 0,
            failed_units: 0,
            cancelled: false,
        }
    }

    /// 所有单元都翻译成功且未被取消
    pub fn is_complete(&self) -> bool {
        self.failed_units == 0 && !self.cancelled
    }
}

impl From<TranslationReport> for TranslationResult {
    fn from(report: TranslationReport) -> Self {
        TranslationResult {
            translated_content: report.translated_content,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeepLXRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Deserialize)]
pub struct DeepLXResponse {
    pub code: i32,
    pub data: String,
}
