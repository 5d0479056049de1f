// ==========================================
// 订阅财务后台 - 映射编辑器与预览生成
// ==========================================
// 职责: 维护可编辑映射 / 映射覆盖检查 / 有限预览 / 全批次无效计数
// 两层校验:
//   - MappingCoverage: 必填字段是否已映射（硬门槛，阻断提交）
//   - RecordValidity : 每条记录必填值是否非空（仅提示）
// ==========================================

use crate::domain::field::{EntitySchema, FieldSpec};
use crate::domain::mapping::{ColumnMapping, MappedRecord, PreviewRow};
use crate::domain::record::RawBatch;
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::record_validator::RecordValidator;
use std::sync::Arc;
use tracing::debug;

/// 默认预览行数
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone)]
pub struct MappingEditor {
    schema: EntitySchema,
    batch: Arc<RawBatch>,
    mapping: ColumnMapping,
    validator: RecordValidator,
    invalid_count: usize,
}

impl MappingEditor {
    /// 以推断结果为种子创建编辑器
    pub fn new(schema: EntitySchema, batch: Arc<RawBatch>, seed: ColumnMapping) -> Self {
        let validator = RecordValidator::new(&schema);
        let invalid_count = validator.count_invalid(batch.records(), &seed);
        Self {
            schema,
            batch,
            mapping: seed,
            validator,
            invalid_count,
        }
    }

    pub fn current_mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn batch(&self) -> &Arc<RawBatch> {
        &self.batch
    }

    /// 用户修改映射；header 为 None 表示取消映射
    ///
    /// # 错误
    /// - UnknownField: 字段不在字段表中
    /// - UnknownHeader: 表头不在文件中
    pub fn set_mapping(&mut self, field_key: &str, header: Option<&str>) -> ImporterResult<()> {
        if self.schema.field(field_key).is_none() {
            return Err(ImportError::UnknownField(field_key.to_string()));
        }

        match header {
            Some(h) => {
                if !self.batch.headers().iter().any(|known| known == h) {
                    return Err(ImportError::UnknownHeader(h.to_string()));
                }
                self.mapping.bind(field_key, h);
            }
            None => {
                self.mapping.unbind(field_key);
            }
        }

        self.invalid_count = self
            .validator
            .count_invalid(self.batch.records(), &self.mapping);
        debug!(
            field = %field_key,
            header = ?header,
            invalid = self.invalid_count,
            "映射已修改"
        );
        Ok(())
    }

    /// 当前未映射的必填字段（字段表顺序）
    pub fn missing_required_fields(&self) -> Vec<&FieldSpec> {
        self.schema
            .required_fields()
            .filter(|f| !self.mapping.is_mapped(&f.key))
            .collect()
    }

    /// 映射覆盖检查；不满足时错误中列出缺失字段名称
    pub fn check_coverage(&self) -> ImporterResult<()> {
        let missing = self.missing_required_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MappingIncomplete {
                missing: missing.iter().map(|f| f.label.clone()).collect(),
            })
        }
    }

    /// 前 limit 条记录（文件顺序）的预览
    pub fn preview(&self, limit: usize) -> Vec<PreviewRow> {
        self.batch
            .records()
            .iter()
            .take(limit)
            .enumerate()
            .map(|(row_index, record)| PreviewRow {
                row_index,
                values: MappedRecord::from_record(record, &self.mapping, &self.schema),
                valid: self.validator.is_valid(record, &self.mapping),
            })
            .collect()
    }

    /// 全批次中必填值缺失的记录数
    pub fn invalid_record_count(&self) -> usize {
        self.invalid_count
    }

    /// 全批次映射后的记录（提交用，包括无效记录）
    pub fn transformed_records(&self) -> Vec<MappedRecord> {
        self.batch
            .records()
            .iter()
            .map(|record| MappedRecord::from_record(record, &self.mapping, &self.schema))
            .collect()
    }
}
