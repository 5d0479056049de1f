// ==========================================
// 订阅财务后台 - 领域模型层
// ==========================================
// 职责: 定义导入相关的实体与值类型
// 红线: 不含文件读取逻辑，不含网络调用
// ==========================================

pub mod field;
pub mod import_result;
pub mod mapping;
pub mod record;
pub mod types;

// 重导出核心类型
pub use field::{EntitySchema, FieldSpec, ENTITY_DESPESAS, ENTITY_PROSPECCAO, ENTITY_USUARIOS};
pub use import_result::{ImportResult, RecordOutcome};
pub use mapping::{ColumnMapping, MappedRecord, PreviewRow};
pub use record::{RawBatch, RawRecord};
pub use types::{CellValue, FieldType, RecordStatus, SessionState};
