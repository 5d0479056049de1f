// ==========================================
// 订阅财务后台 - 领域类型定义
// ==========================================
// 职责: 单元格值 / 字段类型 / 会话状态 / 记录结果状态
// 红线: 单元格值保持原始类型，不在本层做类型强制转换
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 单元格值 (Cell Value)
// ==========================================
// 序列化格式: 无标签（与 JSON 原生类型一一对应）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// 构造文本值
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// 是否为 Null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// 隐式字符串转换（Null → ""，整数不带小数点）
    pub fn coerce_to_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

// ==========================================
// 字段逻辑类型 (Field Type)
// ==========================================
// 仅用于展示，本子系统不做强制转换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Boolean,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Number => write!(f, "number"),
            FieldType::Date => write!(f, "date"),
            FieldType::Boolean => write!(f, "boolean"),
        }
    }
}

// ==========================================
// 导入会话状态 (Session State)
// ==========================================
// FileSelected → MappingProposed → MappingEdited* → (Confirmed | Cancelled)
// Committing 为提交进行中的瞬时状态；提交失败回到 MappingEdited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    FileSelected,
    MappingProposed,
    MappingEdited,
    Committing,
    Confirmed,
    Cancelled,
}

impl SessionState {
    /// 是否允许编辑映射
    pub fn is_editable(&self) -> bool {
        matches!(self, SessionState::MappingProposed | SessionState::MappingEdited)
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Confirmed | SessionState::Cancelled)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::FileSelected => write!(f, "FILE_SELECTED"),
            SessionState::MappingProposed => write!(f, "MAPPING_PROPOSED"),
            SessionState::MappingEdited => write!(f, "MAPPING_EDITED"),
            SessionState::Committing => write!(f, "COMMITTING"),
            SessionState::Confirmed => write!(f, "CONFIRMED"),
            SessionState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ==========================================
// 单条记录落库结果 (Record Status)
// ==========================================
// 由外部持久化服务给出，本子系统只负责展示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Skipped,
    Error,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Success => write!(f, "success"),
            RecordStatus::Skipped => write!(f, "skipped"),
            RecordStatus::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_string_coercion() {
        assert_eq!(CellValue::Null.coerce_to_string(), "");
        assert_eq!(CellValue::Number(0.0).coerce_to_string(), "0");
        assert_eq!(CellValue::Number(2.5).coerce_to_string(), "2.5");
        assert_eq!(CellValue::Boolean(false).coerce_to_string(), "false");
        assert_eq!(CellValue::text("Ana").coerce_to_string(), "Ana");
    }

    #[test]
    fn test_cell_value_json_untagged() {
        let json = serde_json::to_string(&vec![
            CellValue::Null,
            CellValue::Boolean(true),
            CellValue::Number(11.0),
            CellValue::text("x"),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,true,11.0,"x"]"#);
    }

    #[test]
    fn test_session_state_editable() {
        assert!(SessionState::MappingProposed.is_editable());
        assert!(SessionState::MappingEdited.is_editable());
        assert!(!SessionState::FileSelected.is_editable());
        assert!(!SessionState::Committing.is_editable());
        assert!(SessionState::Cancelled.is_terminal());
    }
}
