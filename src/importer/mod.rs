// ==========================================
// 订阅财务后台 - 导入层
// ==========================================
// 职责: 电子表格批量导入（用户 / 潜在客户 / 费用）
// 管道: 文件解析 → 列映射推断 → 映射编辑与预览 → 提交持久化服务
// 支持: CSV, XLSX
// ==========================================

// 模块声明
pub mod alias_table;
pub mod commit_coordinator;
pub mod error;
pub mod file_parser;
pub mod importer_trait;
pub mod mapping_editor;
pub mod mapping_inference;
pub mod record_validator;
pub mod session;
pub mod summary;

// 重导出核心类型
pub use alias_table::AliasTable;
pub use commit_coordinator::{CommitReport, ImportCommitCoordinator};
pub use error::{CollaboratorError, ImportError, ImporterResult};
pub use file_parser::{CancelFlag, CsvParser, ExcelParser, UniversalFileParser};
pub use mapping_editor::{MappingEditor, DEFAULT_PREVIEW_ROWS};
pub use mapping_inference::{ColumnMappingInferrer, InferredBinding, MatchTier};
pub use record_validator::RecordValidator;
pub use session::{CommitTicket, ImportSession};
pub use summary::{ImportSummary, DEFAULT_MAX_ERROR_DETAILS};

// 重导出 Trait 接口
pub use importer_trait::{FileParser, MappingInferrer, PersistenceCollaborator};
