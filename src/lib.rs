// ==========================================
// 订阅财务后台 - 批量导入核心库
// ==========================================
// 职责: 电子表格导入对账管道
//   文件解析 → 列映射推断 → 映射编辑/预览 → 提交外部持久化服务
// 系统定位: 映射与预览为客户端提示，持久化服务为最终裁决方
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "pt-BR");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 解析 / 映射 / 提交
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 会话接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CellValue, FieldType, RecordStatus, SessionState};

// 领域实体
pub use domain::{
    ColumnMapping, EntitySchema, FieldSpec, ImportResult, MappedRecord, PreviewRow, RawBatch,
    RawRecord, RecordOutcome,
};

// 导入管道
pub use importer::{
    ColumnMappingInferrer, ImportCommitCoordinator, ImportError, ImportSession, MappingEditor,
    PersistenceCollaborator, UniversalFileParser,
};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "订阅财务后台 - 批量导入";
