// ==========================================
// 订阅财务后台 - 原始记录
// ==========================================
// 职责: 一行数据 = 表头(原文) → 单元格值 的有序映射
// 红线: 表头保持文件中的原样，不做任何标准化
// ==========================================

use crate::domain::types::CellValue;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;

// ==========================================
// RawRecord - 单行原始记录
// ==========================================
// 表头序列由同一批次的所有记录共享
// 行长度不足时，缺失列视为"不存在"而不是 Null
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    headers: Arc<[String]>,
    cells: Vec<CellValue>,
}

impl RawRecord {
    /// 由共享表头和单元格构造（多余单元格截断）
    pub fn new(headers: Arc<[String]>, mut cells: Vec<CellValue>) -> Self {
        cells.truncate(headers.len());
        Self { headers, cells }
    }

    /// 按表头读取单元格
    ///
    /// # 返回
    /// - None: 表头不存在，或该行没有这一列
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        let idx = self.headers.iter().position(|h| h == header)?;
        self.cells.get(idx)
    }

    /// 表头序列（文件顺序）
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// 按文件顺序遍历 (表头, 值)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.headers
            .iter()
            .zip(self.cells.iter())
            .map(|(h, v)| (h.as_str(), v))
    }

    /// 整行是否为空白（全部 Null 或仅含空白字符的文本）
    ///
    /// 行过滤比字段级缺失判定更严格: 单个字段的 `" "` 算有值，
    /// 但一整行只有空白字符时整行丢弃
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|v| match v {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        })
    }
}

impl Serialize for RawRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (header, value) in self.iter() {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

// ==========================================
// RawBatch - 一次导入的完整批次
// ==========================================
// 解析后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct RawBatch {
    headers: Arc<[String]>,
    records: Vec<RawRecord>,
}

impl RawBatch {
    pub fn new(headers: Arc<[String]>, records: Vec<RawRecord>) -> Self {
        Self { headers, records }
    }

    /// 便捷构造（测试 / 内存数据）
    pub fn from_rows<H, R>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = Vec<CellValue>>,
    {
        let headers: Arc<[String]> = headers.into_iter().map(Into::into).collect();
        let records = rows
            .into_iter()
            .map(|cells| RawRecord::new(Arc::clone(&headers), cells))
            .collect();
        Self { headers, records }
    }

    /// 文件中发现的表头（文件顺序）
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
