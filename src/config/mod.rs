// ==========================================
// 订阅财务后台 - 配置层
// ==========================================
// 职责: 导入配置管理（预览行数 / 明细条数 / 文件上限 / 语言 / 别名覆写）
// 存储: JSON 配置文件
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, ImportConfig, DEFAULT_MAX_FILE_SIZE_MB};
pub use import_config_trait::{ConfigResult, ImportConfigReader};
