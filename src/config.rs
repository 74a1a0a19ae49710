//! 配置管理模块
//!
//! 提供TOML配置文件的读取、写入、自动发现和环境变量覆盖。

use crate::error::Result;
use crate::types::{RetryConfig, TranslationConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 配置文件的默认查找位置
pub const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "translation-config.toml",
    "config.toml",
    ".translation-config.toml",
];

/// 翻译库配置结构
///
/// # 示例
///
/// ```rust,no_run
/// use textbook_translator::TranslationLibConfig;
///
/// // 从默认位置加载配置
/// let config = TranslationLibConfig::load_from_default_locations();
///
/// // 从指定文件加载配置
/// let config = TranslationLibConfig::from_file("config.toml").unwrap();
///
/// // 保存配置到文件
/// config.save_to_file("output.toml").unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationLibConfig {
    /// 翻译配置
    #[serde(default)]
    pub translation: TranslationConfig,
    /// 重试配置
    #[serde(default)]
    pub retry: RetryConfig,
}

impl TranslationLibConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from multiple possible locations
    pub fn load_from_default_locations() -> Self {
        for path in DEFAULT_CONFIG_PATHS {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("Loaded configuration from: {}", path);
                        return config.apply_env_overrides();
                    }
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path, e);
                    }
                }
            }
        }

        log::info!("No configuration file found, using defaults");
        Self::default().apply_env_overrides()
    }

    /// 用环境变量覆盖配置
    ///
    /// 支持 `OPENAI_API_KEY`、`TRANSLATION_API_URL`、`TRANSLATION_TARGET_LANG`。
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.translation.api_key = Some(key);
        }
        if let Some(url) = lookup("TRANSLATION_API_URL") {
            log::debug!("Translation API url overridden from environment");
            self.translation.api_url = url;
        }
        if let Some(lang) = lookup("TRANSLATION_TARGET_LANG") {
            self.translation.target_lang = lang;
        }
        self
    }

    /// Generate example configuration file
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::default().save_to_file(path)
    }
}
