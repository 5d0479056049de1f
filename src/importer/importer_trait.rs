// ==========================================
// 订阅财务后台 - 导入管道 Trait
// ==========================================
// 职责: 定义导入管道各环节接口（不包含实现）
// 管道: 文件解析 → 列映射推断 → 映射编辑/预览 → 提交协作方
// ==========================================

use crate::domain::field::EntitySchema;
use crate::domain::import_result::ImportResult;
use crate::domain::mapping::{ColumnMapping, MappedRecord};
use crate::domain::record::RawBatch;
use crate::importer::error::{CollaboratorError, ImporterResult};
use crate::importer::file_parser::CancelFlag;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（组件 1）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始记录批次
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - cancel: 取消标志（每行检查一次）
    ///
    /// # 返回
    /// - Ok(RawBatch): 表头 + 数据行（首行固定为表头，表头原样保留）
    /// - Err(EmptyFile): 表头之后没有数据行
    /// - Err(Cancelled): 解析过程中被取消
    fn parse_to_raw_batch(&self, file_path: &Path, cancel: &CancelFlag) -> ImporterResult<RawBatch>;
}

// ==========================================
// MappingInferrer Trait
// ==========================================
// 用途: 列映射推断接口（组件 3）
// 实现者: ColumnMappingInferrer
pub trait MappingInferrer: Send + Sync {
    /// 根据文件表头与字段表推断初始映射
    ///
    /// # 约束
    /// - 确定性: 相同输入始终得到相同映射
    /// - 无需用户交互
    fn infer(&self, headers: &[String], schema: &EntitySchema) -> ColumnMapping;
}

// ==========================================
// PersistenceCollaborator Trait
// ==========================================
// 用途: 外部持久化服务（创建 / 去重由对方负责）
// 实现者: 宿主应用提供（HTTP 客户端等）
#[async_trait]
pub trait PersistenceCollaborator: Send + Sync {
    /// 提交整批映射后的记录
    ///
    /// # 返回
    /// - Ok(ImportResult): 成功 / 跳过 / 失败计数与明细
    /// - Err: 网络错误或非 2xx 响应（整批视为未导入）
    async fn import_records(
        &self,
        entity: &str,
        records: Vec<MappedRecord>,
    ) -> Result<ImportResult, CollaboratorError>;
}
