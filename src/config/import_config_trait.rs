// ==========================================
// 订阅财务后台 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（JSON 配置文件），测试中的 MockConfig
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 预览与摘要 =====

    /// 获取预览行数
    ///
    /// # 默认值
    /// - 5
    async fn get_preview_rows(&self) -> ConfigResult<usize>;

    /// 获取摘要中逐条列出的失败明细数
    ///
    /// # 默认值
    /// - 10
    async fn get_max_error_details(&self) -> ConfigResult<usize>;

    // ===== 文件 =====

    /// 获取上传文件大小上限（字节）
    ///
    /// # 默认值
    /// - 10 MB
    async fn get_max_file_size_bytes(&self) -> ConfigResult<u64>;

    // ===== 映射 =====

    /// 获取字段别名覆写（字段 key → 追加的别名）
    ///
    /// # 说明
    /// - 追加到内置别名之后，不替换内置别名
    async fn get_alias_overrides(&self) -> ConfigResult<HashMap<String, Vec<String>>>;

    // ===== 界面 =====

    /// 获取用户提示语言
    ///
    /// # 默认值
    /// - "pt-BR"
    async fn get_locale(&self) -> ConfigResult<String>;
}
