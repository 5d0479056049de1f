// ==========================================
// 订阅财务后台 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将导入层错误转换为用户可读的提示
// 约束: 映射缺口必须指明缺失字段；提交失败必须提示可重试
// ==========================================

use crate::importer::error::ImportError;
use crate::importer::summary::user_message;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 导入错误
    // ==========================================
    /// 文件不可用（格式 / 大小 / 内容），会话无法建立
    #[error("文件导入失败: {0}")]
    ImportError(String),

    /// 必填字段未映射，仅阻断确认操作
    #[error("{message}")]
    MappingIncomplete {
        message: String,
        missing: Vec<String>,
    },

    #[error("{0}")]
    CommitInFlight(String),

    /// 提交失败（可重试，会话保持可编辑）
    #[error("{0}")]
    CommitFailed(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 按指定语言转换导入层错误
    pub fn localized(err: ImportError, locale: &str) -> Self {
        let message = user_message(&err, locale);
        match err {
            ImportError::MappingIncomplete { missing } => {
                ApiError::MappingIncomplete { message, missing }
            }
            ImportError::CommitInFlight => ApiError::CommitInFlight(message),
            ImportError::CommitFailed(_) => ApiError::CommitFailed(message),
            ImportError::InvalidState { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            ImportError::UnknownField(_) | ImportError::UnknownHeader(_) => {
                ApiError::InvalidInput(message)
            }
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(e) => ApiError::Other(e),
            _ => ApiError::ImportError(message),
        }
    }

    /// 是否可在不重新选择文件的情况下重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::CommitFailed(_) | ApiError::CommitInFlight(_) | ApiError::MappingIncomplete { .. }
        )
    }
}

// ==========================================
// 从 ImportError 转换（默认语言）
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::localized(err, crate::i18n::DEFAULT_LOCALE)
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
