//! 翻译编排模块
//!
//! 根据是否保留格式以及配置的策略选择翻译路径：
//!
//! - 占位符策略：提取 → 整篇翻译一次 → 回填占位符
//! - 分块策略：解析 → 逐块翻译可翻译块 → 重建
//! - 不保留格式：整篇原文作为不透明文本翻译一次
//!
//! 任何单元翻译失败都只会把该单元替换为错误标记，不会让整篇文档失败。
//! 每次调用都在本地创建占位符映射和块序列，请求之间没有共享的可变状态。

use crate::blocks::parse;
use crate::config::TranslationLibConfig;
use crate::error::Result;
use crate::extractor::{extract, PlaceholderMap};
use crate::restorer::{reconstruct, restore_placeholders};
use crate::translator::{invoke, translator_from_config, CancellationToken, Invocation, Translator};
use crate::types::{
    TranslationConfig, TranslationReport, TranslationRequest, TranslationResult, TranslationStrategy,
};
use std::sync::Arc;

/// 翻译服务
///
/// # 示例
///
/// ```rust
/// use std::sync::Arc;
/// use textbook_translator::{MockTranslator, TranslationConfig, TranslationService};
///
/// #[tokio::main]
/// async fn main() {
///     let service = TranslationService::new(TranslationConfig::default(), Arc::new(MockTranslator::new()));
///     let translated = service.translate_by_blocks("# Title\n\n```\ncode\n```").await;
///     assert_eq!(translated, "# URDU TRANSLATION: Title\n\n```\ncode\n```");
/// }
/// ```
#[derive(Clone)]
pub struct TranslationService {
    translator: Arc<dyn Translator>,
    config: TranslationConfig,
}

impl TranslationService {
    pub fn new(config: TranslationConfig, translator: Arc<dyn Translator>) -> Self {
        Self { translator, config }
    }

    /// 按配置创建翻译后端和服务
    pub fn from_config(config: &TranslationLibConfig) -> Result<Self> {
        let translator = translator_from_config(&config.translation, &config.retry)?;
        Ok(Self::new(config.translation.clone(), translator))
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 处理调用方的翻译请求
    pub async fn handle(&self, request: TranslationRequest) -> TranslationResult {
        log::info!(
            "Received translation request with formatting preservation: {}",
            request.preserve_formatting
        );
        self.translate_report(&request.content, request.preserve_formatting)
            .await
            .into()
    }

    /// 处理按块翻译的请求，忽略 `preserve_formatting`
    pub async fn handle_by_blocks(&self, request: TranslationRequest) -> TranslationResult {
        log::info!("Received translation request by blocks");
        self.translate_by_blocks_report(&request.content).await.into()
    }

    /// 翻译文档
    ///
    /// `preserve_formatting` 为真时使用配置的策略，否则整篇原文一次翻译。
    pub async fn translate(&self, content: &str, preserve_formatting: bool) -> String {
        self.translate_report(content, preserve_formatting)
            .await
            .translated_content
    }

    pub async fn translate_report(&self, content: &str, preserve_formatting: bool) -> TranslationReport {
        let strategy = if preserve_formatting {
            self.config.strategy
        } else {
            TranslationStrategy::Raw
        };
        self.run(content, strategy, &CancellationToken::new()).await
    }

    /// 按块翻译文档
    pub async fn translate_by_blocks(&self, content: &str) -> String {
        self.translate_by_blocks_report(content).await.translated_content
    }

    pub async fn translate_by_blocks_report(&self, content: &str) -> TranslationReport {
        self.run(content, TranslationStrategy::Blocks, &CancellationToken::new())
            .await
    }

    /// 可取消的按块翻译
    ///
    /// 取消后不再发起新的调用，正在进行的调用被放弃，
    /// 尚未翻译的块保持原文。
    pub async fn translate_by_blocks_cancellable(
        &self,
        content: &str,
        cancel: &CancellationToken,
    ) -> TranslationReport {
        self.run(content, TranslationStrategy::Blocks, cancel).await
    }

    /// 用占位符策略翻译整篇文档
    pub async fn translate_with_placeholders(&self, content: &str) -> String {
        self.translate_with_placeholders_report(content)
            .await
            .translated_content
    }

    pub async fn translate_with_placeholders_report(&self, content: &str) -> TranslationReport {
        self.run(content, TranslationStrategy::Placeholders, &CancellationToken::new())
            .await
    }

    async fn run(
        &self,
        content: &str,
        strategy: TranslationStrategy,
        cancel: &CancellationToken,
    ) -> TranslationReport {
        if !self.config.enabled || content.trim().is_empty() {
            return TranslationReport::unchanged(content, strategy);
        }

        log::info!(
            "Translating {} chars with {:?} strategy via {}",
            content.len(),
            strategy,
            self.translator.name()
        );

        let report = match strategy {
            TranslationStrategy::Raw => self.translate_raw(content, cancel).await,
            TranslationStrategy::Placeholders => self.translate_placeholders(content, cancel).await,
            TranslationStrategy::Blocks => self.translate_blocks(content, cancel).await,
        };

        if report.is_complete() {
            log::info!("Translation completed successfully ({} units)", report.units);
        } else {
            log::warn!(
                "Translation degraded: {} of {} units failed, cancelled: {}",
                report.failed_units,
                report.units,
                report.cancelled
            );
        }
        report
    }

    async fn call(&self, text: &str, cancel: &CancellationToken) -> Invocation {
        invoke(self.translator.as_ref(), text, self.config.request_timeout(), cancel).await
    }

    async fn translate_raw(&self, content: &str, cancel: &CancellationToken) -> TranslationReport {
        let mut report = TranslationReport::unchanged(content, TranslationStrategy::Raw);
        report.units = 1;

        match self.call(content, cancel).await {
            Invocation::Translated(text) => report.translated_content = text,
            Invocation::Failed { fallback, .. } => {
                report.translated_content = fallback;
                report.failed_units = 1;
            }
            Invocation::Cancelled => report.cancelled = true,
        }
        report
    }

    async fn translate_placeholders(&self, content: &str, cancel: &CancellationToken) -> TranslationReport {
        let (clean, map) = extract(content);
        let mut report = TranslationReport::unchanged(content, TranslationStrategy::Placeholders);

        if !has_translatable_text(&clean, &map) {
            log::debug!("Only protected spans found, nothing to translate");
            return report;
        }
        report.units = 1;

        match self.call(&clean, cancel).await {
            Invocation::Translated(text) => {
                let missing = map.missing_from(&clean, &text);
                if !missing.is_empty() {
                    if self.config.verify_placeholders {
                        log::warn!(
                            "Translator dropped {} placeholders ({}), retranslating by blocks",
                            missing.len(),
                            missing.join(", ")
                        );
                        let mut fallback = self.translate_blocks(content, cancel).await;
                        fallback.units += report.units;
                        return fallback;
                    }
                    log::warn!("Translator dropped {} placeholders", missing.len());
                }
                report.translated_content = restore_placeholders(&text, &map);
            }
            Invocation::Failed { fallback, .. } => {
                report.translated_content = restore_placeholders(&fallback, &map);
                report.failed_units = 1;
            }
            Invocation::Cancelled => report.cancelled = true,
        }
        report
    }

    async fn translate_blocks(&self, content: &str, cancel: &CancellationToken) -> TranslationReport {
        let mut blocks = parse(content);
        let mut report = TranslationReport::unchanged(content, TranslationStrategy::Blocks);

        for block in blocks
            .iter_mut()
            .filter(|block| block.kind.is_translatable() && !block.content.trim().is_empty())
        {
            report.units += 1;
            match self.call(&block.content, cancel).await {
                Invocation::Translated(text) => block.content = text,
                Invocation::Failed { fallback, reason } => {
                    log::warn!("Block '{}' failed: {}", block.kind.name(), reason);
                    block.content = fallback;
                    report.failed_units += 1;
                }
                Invocation::Cancelled => {
                    report.cancelled = true;
                    break;
                }
            }
        }

        report.translated_content = reconstruct(&blocks);
        report
    }
}

/// 去掉所有占位符后是否还有文字
fn has_translatable_text(clean: &str, map: &PlaceholderMap) -> bool {
    let remainder = map
        .tokens()
        .fold(clean.to_string(), |text, token| text.replace(token, ""));
    !remainder.trim().is_empty()
}
