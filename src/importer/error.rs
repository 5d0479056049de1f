// ==========================================
// 订阅财务后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 文件读取（会话致命）/ 映射缺口（可恢复）/ 提交失败（可重试）
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（会话致命） =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx）")]
    UnsupportedFormat(String),

    #[error("文件过大: {size_bytes} 字节（上限 {max_bytes} 字节）")]
    FileTooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件无数据行")]
    EmptyFile,

    #[error("文件解析已取消")]
    Cancelled,

    // ===== 映射错误（可恢复） =====
    #[error("未知字段: {0}")]
    UnknownField(String),

    #[error("文件中不存在列: {0}")]
    UnknownHeader(String),

    #[error("必填字段未映射: {}", .missing.join(", "))]
    MappingIncomplete { missing: Vec<String> },

    // ===== 提交错误（可重试） =====
    #[error("已有提交正在进行中")]
    CommitInFlight,

    #[error("提交失败: {0}")]
    CommitFailed(String),

    // ===== 会话状态错误 =====
    #[error("无效的状态转换: from={from} to={to}")]
    InvalidState { from: String, to: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为会话致命错误（需要重新选择文件）
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound(_)
                | ImportError::UnsupportedFormat(_)
                | ImportError::FileTooLarge { .. }
                | ImportError::FileReadError(_)
                | ImportError::ExcelParseError(_)
                | ImportError::CsvParseError(_)
                | ImportError::EmptyFile
                | ImportError::Cancelled
        )
    }

    /// 是否可通过重试提交恢复
    pub fn is_retryable(&self) -> bool {
        matches!(self, ImportError::CommitFailed(_) | ImportError::CommitInFlight)
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImporterResult<T> = Result<T, ImportError>;

// ==========================================
// CollaboratorError - 外部持久化服务错误
// ==========================================
// 任何变体都视为整批未导入
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("网络错误: {0}")]
    Transport(String),

    #[error("服务端拒绝 (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("响应格式错误: {0}")]
    InvalidResponse(String),
}

impl From<CollaboratorError> for ImportError {
    fn from(err: CollaboratorError) -> Self {
        ImportError::CommitFailed(err.to_string())
    }
}
