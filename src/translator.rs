//! 翻译调用模块
//!
//! 把外部翻译后端（神经翻译模型或LLM）抽象为 [`Translator`] trait，
//! 并提供带超时、取消和失败回退的单次调用入口 [`invoke`]。
//! 速率限制和指数退避重试供HTTP后端使用。

use crate::deeplx::DeepLXTranslator;
use crate::error::{Result, TranslationError};
use crate::mock::MockTranslator;
use crate::openai::OpenAiTranslator;
use crate::types::{ProviderKind, RetryConfig, TranslationConfig};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore, SemaphorePermit};
use tokio::time::sleep;

/// 外部文本翻译后端
///
/// 输入输出均为纯文本，实现者不应假设文本是JSON或Markdown。
#[async_trait]
pub trait Translator: Send + Sync {
    /// 翻译一段文本
    async fn translate_text(&self, text: &str) -> Result<String>;

    /// 后端名称，用于日志
    fn name(&self) -> &str;
}

/// 根据配置创建翻译后端
pub fn translator_from_config(
    config: &TranslationConfig,
    retry: &RetryConfig,
) -> Result<Arc<dyn Translator>> {
    let translator: Arc<dyn Translator> = match config.provider {
        ProviderKind::DeepLX => Arc::new(DeepLXTranslator::new(config.clone(), retry.clone())),
        ProviderKind::OpenAi => Arc::new(OpenAiTranslator::new(config.clone(), retry.clone())?),
        ProviderKind::Mock => Arc::new(MockTranslator::new()),
    };
    log::info!("Using translator backend: {}", translator.name());
    Ok(translator)
}

/// 翻译失败时的回退文本
pub fn fallback_marker(original: &str) -> String {
    format!("[TRANSLATION ERROR: {}]", original)
}

/// 取消令牌
///
/// 可克隆，任意一个副本调用 [`CancellationToken::cancel`] 后所有副本都会观察到。
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// 等待取消
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // sender 由 self 持有，不会在等待期间被释放
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

/// 单次调用的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// 翻译成功
    Translated(String),
    /// 翻译失败，`fallback` 为带标记的原文
    Failed { fallback: String, reason: String },
    /// 调用被取消
    Cancelled,
}

impl Invocation {
    /// 成功时返回译文，失败时返回回退文本；取消时返回 `None`
    pub fn into_text(self) -> Option<String> {
        match self {
            Invocation::Translated(text) => Some(text),
            Invocation::Failed { fallback, .. } => Some(fallback),
            Invocation::Cancelled => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Invocation::Failed { .. })
    }
}

/// 调用翻译后端一次
///
/// 空白文本不调用后端直接返回。后端错误和超时都被转换为
/// [`Invocation::Failed`]，不会向上传播。
pub async fn invoke(
    translator: &dyn Translator,
    text: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Invocation {
    if text.trim().is_empty() {
        return Invocation::Translated(text.to_string());
    }
    if cancel.is_cancelled() {
        return Invocation::Cancelled;
    }

    let outcome = tokio::select! {
        result = tokio::time::timeout(timeout, translator.translate_text(text)) => {
            match result {
                Ok(inner) => inner,
                Err(_) => Err(TranslationError::Timeout(timeout)),
            }
        }
        _ = cancel.cancelled() => Err(TranslationError::Cancelled),
    };

    match outcome {
        Ok(translated) => Invocation::Translated(translated),
        Err(TranslationError::Cancelled) => {
            log::info!("Translation call to {} cancelled", translator.name());
            Invocation::Cancelled
        }
        Err(e) => {
            log::warn!("Translation call to {} failed: {}", translator.name(), e);
            Invocation::Failed {
                fallback: fallback_marker(text),
                reason: e.to_string(),
            }
        }
    }
}

/// 速率限制器
///
/// 用于控制API请求频率，防止超出服务提供商的速率限制。
#[derive(Clone)]
pub struct RateLimiter {
    /// 信号量，用于控制并发请求数量
    semaphore: Arc<Semaphore>,
    /// 请求间隔延迟
    delay: Duration,
}

impl RateLimiter {
    /// 创建新的速率限制器
    ///
    /// # 参数
    ///
    /// * `requests_per_second` - 每秒允许的最大请求数
    ///
    /// # 示例
    ///
    /// ```rust
    /// use textbook_translator::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(1.0); // 每秒1个请求
    /// ```
    pub fn new(requests_per_second: f64) -> Self {
        let requests_per_second = if requests_per_second > 0.0 { requests_per_second } else { 1.0 };
        let permits = (requests_per_second * 2.0).ceil().max(1.0) as usize;
        let delay = Duration::from_millis((500.0 / requests_per_second) as u64);

        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            delay,
        }
    }

    /// 获取请求许可
    ///
    /// 在发起API请求前调用此方法，确保不超过配置的速率限制。
    /// 返回的许可需要持有到请求结束，释放后其他请求才能占用这个并发名额。
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| TranslationError::RateLimitError(format!("Rate limiter error: {}", e)))?;
        if self.delay > Duration::from_millis(100) {
            sleep(self.delay).await;
        }
        Ok(permit)
    }

    /// 当前空闲的并发名额
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// 带指数退避的重试机制
///
/// # 参数
///
/// * `operation` - 要执行的异步操作
/// * `config` - 重试配置
/// * `rate_limiter` - 速率限制器
///
/// # 返回
///
/// * `Ok(T)` - 操作成功的结果
/// * `Err(TranslationError)` - 所有重试尝试失败后的最后一个错误
pub async fn retry_with_backoff<F, Fut, T>(
    mut operation: F,
    config: &RetryConfig,
    rate_limiter: &RateLimiter,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = config.initial_delay_ms;
    let mut attempt = 0;

    loop {
        let permit = rate_limiter.acquire().await?;
        let outcome = operation().await;
        drop(permit);

        match outcome {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= config.max_retries => return Err(e),
            Err(e) => {
                attempt += 1;
                log::warn!("Attempt {} failed: {}. Retrying in {}ms...", attempt, e, delay);
                sleep(Duration::from_millis(delay)).await;
                delay = std::cmp::min(
                    (delay as f64 * config.backoff_multiplier) as u64,
                    config.max_delay_ms,
                );
            }
        }
    }
}
