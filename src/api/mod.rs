// ==========================================
// 订阅财务后台 - API 层
// ==========================================
// 职责: 提供导入会话 API，供界面 / 宿主应用调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportConfirmResponse, ImportSessionView};
