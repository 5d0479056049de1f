// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use backoffice_import::config::{ConfigResult, ImportConfigReader};
use std::collections::HashMap;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub preview_rows: usize,
    pub max_error_details: usize,
    pub max_file_size_bytes: u64,
    pub locale: String,
    pub alias_overrides: HashMap<String, Vec<String>>,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            preview_rows: 5,
            max_error_details: 10,
            max_file_size_bytes: 10 * 1024 * 1024,
            locale: "pt-BR".to_string(),
            alias_overrides: HashMap::new(),
        }
    }

    /// 指定提示语言
    pub fn with_locale(locale: &str) -> Self {
        let mut config = Self::default();
        config.locale = locale.to_string();
        config
    }

    /// 指定文件大小上限
    pub fn with_max_file_size_bytes(max_bytes: u64) -> Self {
        let mut config = Self::default();
        config.max_file_size_bytes = max_bytes;
        config
    }

    /// 追加字段别名
    pub fn with_alias(field_key: &str, aliases: &[&str]) -> Self {
        let mut config = Self::default();
        config.alias_overrides.insert(
            field_key.to_string(),
            aliases.iter().map(|a| a.to_string()).collect(),
        );
        config
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_preview_rows(&self) -> ConfigResult<usize> {
        Ok(self.preview_rows)
    }

    async fn get_max_error_details(&self) -> ConfigResult<usize> {
        Ok(self.max_error_details)
    }

    async fn get_max_file_size_bytes(&self) -> ConfigResult<u64> {
        Ok(self.max_file_size_bytes)
    }

    async fn get_alias_overrides(&self) -> ConfigResult<HashMap<String, Vec<String>>> {
        Ok(self.alias_overrides.clone())
    }

    async fn get_locale(&self) -> ConfigResult<String> {
        Ok(self.locale.clone())
    }
}
