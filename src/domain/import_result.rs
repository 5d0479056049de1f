// ==========================================
// 订阅财务后台 - 外部持久化服务返回结果
// ==========================================
// 职责: ImportResult / RecordOutcome（提交后由协作方返回）
// 红线: 去重语义由协作方定义，本层只负责呈现
// ==========================================

use crate::domain::types::RecordStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// RecordOutcome - 单条记录的处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// 关键字段值（如登录邮箱）；旧版接口字段名为 email
    #[serde(alias = "email")]
    pub key_field_value: String,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordOutcome {
    pub fn new(key_field_value: &str, status: RecordStatus, message: Option<&str>) -> Self {
        Self {
            key_field_value: key_field_value.to_string(),
            status,
            message: message.map(str::to_string),
        }
    }
}

// ==========================================
// ImportResult - 批量导入结果汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub success: usize,  // 成功创建
    pub skipped: usize,  // 跳过（重复）
    pub errors: usize,   // 失败
    #[serde(default)]
    pub details: Vec<RecordOutcome>, // 有序的单条明细
}

impl ImportResult {
    /// 失败明细（保持原顺序）
    pub fn failures(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.details
            .iter()
            .filter(|d| d.status == RecordStatus::Error)
    }

    /// 处理的记录总数
    pub fn total(&self) -> usize {
        self.success + self.skipped + self.errors
    }
}
