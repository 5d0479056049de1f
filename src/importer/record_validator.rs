// ==========================================
// 订阅财务后台 - 记录有效性校验
// ==========================================
// 职责: 逐记录的必填字段检查（RecordValidity 层）
// 说明: 该结果仅为提示，不阻断提交；阻断提交的是映射覆盖检查
// 缺失判定: 不存在 / Null / 字符串转换后为空串
//           数值 0 与布尔 false 不算缺失
// ==========================================

use crate::domain::field::{EntitySchema, FieldSpec};
use crate::domain::mapping::ColumnMapping;
use crate::domain::record::RawRecord;
use crate::domain::types::CellValue;

/// 值是否视为缺失
pub fn is_missing(value: Option<&CellValue>) -> bool {
    match value {
        None | Some(CellValue::Null) => true,
        Some(CellValue::Text(s)) => s.is_empty(),
        Some(CellValue::Number(_)) | Some(CellValue::Boolean(_)) => false,
    }
}

// ==========================================
// RecordValidator
// ==========================================
#[derive(Debug, Clone)]
pub struct RecordValidator {
    required: Vec<FieldSpec>,
}

impl RecordValidator {
    pub fn new(schema: &EntitySchema) -> Self {
        Self {
            required: schema.required_fields().cloned().collect(),
        }
    }

    /// 该记录在当前映射下缺失的必填字段
    ///
    /// 必填字段未映射时，对每条记录都算缺失
    pub fn missing_fields<'a>(
        &'a self,
        record: &RawRecord,
        mapping: &ColumnMapping,
    ) -> Vec<&'a FieldSpec> {
        self.required
            .iter()
            .filter(|field| is_missing(mapping.resolve(record, &field.key)))
            .collect()
    }

    pub fn is_valid(&self, record: &RawRecord, mapping: &ColumnMapping) -> bool {
        self.required
            .iter()
            .all(|field| !is_missing(mapping.resolve(record, &field.key)))
    }

    /// 全批次中无效记录数
    pub fn count_invalid(&self, records: &[RawRecord], mapping: &ColumnMapping) -> usize {
        records
            .iter()
            .filter(|record| !self.is_valid(record, mapping))
            .count()
    }
}
