// ==========================================
// 订阅财务后台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、快照
// 存储: JSON 文件
//   1. 环境变量 BACKOFFICE_IMPORT_CONFIG 指定的路径
//   2. <系统配置目录>/backoffice-import/config.json
// 文件不存在 → 使用默认值；文件格式错误 → 返回错误
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::i18n::{self, DEFAULT_LOCALE};
use crate::importer::mapping_editor::DEFAULT_PREVIEW_ROWS;
use crate::importer::summary::DEFAULT_MAX_ERROR_DETAILS;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 默认文件大小上限（MB）
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;

// ==========================================
// ImportConfig - 配置项全集
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub preview_rows: usize,
    pub max_error_details: usize,
    pub max_file_size_mb: u64,
    pub locale: String,
    pub alias_overrides: HashMap<String, Vec<String>>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
            max_error_details: DEFAULT_MAX_ERROR_DETAILS,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            locale: DEFAULT_LOCALE.to_string(),
            alias_overrides: HashMap::new(),
        }
    }
}

impl ImportConfig {
    /// 校正非法值（回退默认值并记录警告）
    fn sanitized(mut self) -> Self {
        if self.preview_rows == 0 {
            warn!(
                config_key = config_keys::PREVIEW_ROWS,
                "预览行数不能为 0，使用默认值"
            );
            self.preview_rows = DEFAULT_PREVIEW_ROWS;
        }
        if self.max_file_size_mb == 0 {
            warn!(
                config_key = config_keys::MAX_FILE_SIZE_MB,
                "文件大小上限不能为 0，使用默认值"
            );
            self.max_file_size_mb = DEFAULT_MAX_FILE_SIZE_MB;
        }
        if !i18n::available_locales().iter().any(|l| l == &self.locale) {
            warn!(
                config_key = config_keys::LOCALE,
                raw_value = %self.locale,
                "不支持的语言，使用默认语言"
            );
            self.locale = DEFAULT_LOCALE.to_string();
        }
        self
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    config: ImportConfig,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 按默认查找顺序加载配置
    pub fn load() -> ConfigResult<Self> {
        match Self::default_config_path() {
            Some(path) => Self::load_from(path),
            None => {
                debug!("无法确定配置目录，使用默认配置");
                Ok(Self::default())
            }
        }
    }

    /// 从指定文件加载配置
    ///
    /// # 返回
    /// - 文件不存在: 默认配置
    /// - 文件格式错误: Err
    pub fn load_from<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config: ImportConfig = serde_json::from_str(&raw)
            .map_err(|e| format!("配置文件格式错误 ({}): {}", path.display(), e))?;

        info!(path = %path.display(), "配置已加载");
        Ok(Self {
            config: config.sanitized(),
            source: Some(path.to_path_buf()),
        })
    }

    /// 直接使用给定配置（测试 / 嵌入场景）
    pub fn from_config(config: ImportConfig) -> Self {
        Self {
            config: config.sanitized(),
            source: None,
        }
    }

    /// 默认配置文件路径
    pub fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(config_keys::CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        dirs::config_dir().map(|dir| dir.join(config_keys::APP_DIR).join(config_keys::CONFIG_FILE))
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// 配置来源文件（使用默认值时为 None）
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string(&self.config)?)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_preview_rows(&self) -> ConfigResult<usize> {
        Ok(self.config.preview_rows)
    }

    async fn get_max_error_details(&self) -> ConfigResult<usize> {
        Ok(self.config.max_error_details)
    }

    async fn get_max_file_size_bytes(&self) -> ConfigResult<u64> {
        Ok(self.config.max_file_size_mb.saturating_mul(1024 * 1024))
    }

    async fn get_alias_overrides(&self) -> ConfigResult<HashMap<String, Vec<String>>> {
        Ok(self.config.alias_overrides.clone())
    }

    async fn get_locale(&self) -> ConfigResult<String> {
        Ok(self.config.locale.clone())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 配置文件位置
    pub const CONFIG_PATH_ENV: &str = "BACKOFFICE_IMPORT_CONFIG";
    pub const APP_DIR: &str = "backoffice-import";
    pub const CONFIG_FILE: &str = "config.json";

    // 预览与摘要
    pub const PREVIEW_ROWS: &str = "preview_rows";
    pub const MAX_ERROR_DETAILS: &str = "max_error_details";

    // 文件
    pub const MAX_FILE_SIZE_MB: &str = "max_file_size_mb";

    // 界面与映射
    pub const LOCALE: &str = "locale";
    pub const ALIAS_OVERRIDES: &str = "alias_overrides";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::load_from(dir.path().join("absent.json")).unwrap();

        assert!(manager.source().is_none());
        assert_eq!(manager.get_preview_rows().await.unwrap(), 5);
        assert_eq!(manager.get_max_error_details().await.unwrap(), 10);
        assert_eq!(manager.get_max_file_size_bytes().await.unwrap(), 10 * 1024 * 1024);
        assert_eq!(manager.get_locale().await.unwrap(), "pt-BR");
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"preview_rows": 8, "locale": "en", "alias_overrides": {{"emailLogin": ["correo"]}}}}"#
        )
        .unwrap();

        let manager = ConfigManager::load_from(file.path()).unwrap();
        assert_eq!(manager.get_preview_rows().await.unwrap(), 8);
        assert_eq!(manager.get_max_error_details().await.unwrap(), 10);
        assert_eq!(manager.get_locale().await.unwrap(), "en");
        assert_eq!(
            manager.get_alias_overrides().await.unwrap()["emailLogin"],
            vec!["correo".to_string()]
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ preview_rows: ").unwrap();
        assert!(ConfigManager::load_from(file.path()).is_err());
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let manager = ConfigManager::from_config(ImportConfig {
            preview_rows: 0,
            max_file_size_mb: 0,
            locale: "xx".to_string(),
            ..ImportConfig::default()
        });
        assert_eq!(manager.config(), &ImportConfig::default());
    }

    #[test]
    fn test_snapshot_uses_config_keys() {
        let snapshot = ConfigManager::default().get_config_snapshot().unwrap();
        let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(value[config_keys::PREVIEW_ROWS], 5);
        assert_eq!(value[config_keys::MAX_FILE_SIZE_MB], 10);
        assert!(value[config_keys::ALIAS_OVERRIDES].is_object());
    }
}
