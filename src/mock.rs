//! 模拟翻译后端
//!
//! 给文本加上固定前缀代替真实翻译，用于演示和测试。
//! 可以配置在输入包含指定文本时失败，并统计调用次数。

use crate::error::{Result, TranslationError};
use crate::translator::Translator;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 默认前缀
pub const DEFAULT_MOCK_PREFIX: &str = "URDU TRANSLATION: ";

#[derive(Debug, Clone)]
pub struct MockTranslator {
    prefix: String,
    fail_on: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_MOCK_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            fail_on: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 输入包含 `needle` 时返回错误
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    /// 已发生的调用次数（包括失败的调用），克隆出的副本共享计数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate_text(&self, text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(TranslationError::Unavailable(format!(
                    "mock translator refuses input containing {:?}",
                    needle
                )));
            }
        }

        Ok(format!("{}{}", self.prefix, text))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
