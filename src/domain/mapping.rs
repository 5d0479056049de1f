// ==========================================
// 订阅财务后台 - 列映射与映射后记录
// ==========================================
// 职责: ColumnMapping（字段键 → 表头）/ MappedRecord / PreviewRow
// 说明: 同一表头允许绑定到多个字段（非单射），不做唯一性约束
// ==========================================

use crate::domain::field::EntitySchema;
use crate::domain::record::RawRecord;
use crate::domain::types::CellValue;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

// ==========================================
// ColumnMapping - 字段键 → 表头
// ==========================================
// 不存在的键 = 不导入该字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(BTreeMap<String, String>);

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field_key: &str) -> Option<&str> {
        self.0.get(field_key).map(String::as_str)
    }

    /// 绑定字段到表头（覆盖旧值）
    pub fn bind(&mut self, field_key: impl Into<String>, header: impl Into<String>) {
        self.0.insert(field_key.into(), header.into());
    }

    /// 解除字段绑定
    pub fn unbind(&mut self, field_key: &str) -> Option<String> {
        self.0.remove(field_key)
    }

    pub fn is_mapped(&self, field_key: &str) -> bool {
        self.0.contains_key(field_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按映射解析单个字段的值
    ///
    /// # 返回
    /// - None: 字段未映射，或该行没有对应列
    pub fn resolve<'r>(&self, record: &'r RawRecord, field_key: &str) -> Option<&'r CellValue> {
        self.get(field_key).and_then(|header| record.get(header))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ==========================================
// MappedRecord - 应用映射后的记录
// ==========================================
// 按字段表顺序排列；解析不到值（列不存在）的字段省略，
// 空字符串 / 0 / false 等"假值"原样保留
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedRecord {
    values: Vec<(String, CellValue)>,
}

impl MappedRecord {
    /// 对一行原始记录应用映射
    pub fn from_record(record: &RawRecord, mapping: &ColumnMapping, schema: &EntitySchema) -> Self {
        let values = schema
            .fields
            .iter()
            .filter_map(|field| {
                mapping
                    .resolve(record, &field.key)
                    .map(|value| (field.key.clone(), value.clone()))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, field_key: &str) -> Option<&CellValue> {
        self.values
            .iter()
            .find(|(k, _)| k == field_key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for MappedRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl Serialize for MappedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ==========================================
// PreviewRow - 预览行（派生，不存储）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRow {
    pub row_index: usize,      // 文件中的数据行序号（从 0 开始）
    pub values: MappedRecord,  // 映射后的值
    pub valid: bool,           // 所有必填字段均有非空值
}
