// ==========================================
// 订阅财务后台 - 导入结果摘要
// ==========================================
// 职责: 协作方结果 → 可读摘要（计数 + 前 N 条失败明细 + 剩余数量）
//       以及导入错误 → 面向用户的单条提示
// ==========================================

use crate::domain::import_result::{ImportResult, RecordOutcome};
use crate::i18n::t_in;
use crate::importer::error::ImportError;
use serde::{Deserialize, Serialize};

/// 默认展示的失败明细条数
pub const DEFAULT_MAX_ERROR_DETAILS: usize = 10;

// ==========================================
// ImportSummary
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub success: usize,
    pub skipped: usize,
    pub errors: usize,
    pub shown_failures: Vec<RecordOutcome>, // 最多 max_error_details 条
    pub remaining_failures: usize,          // 未逐条列出的失败数
    pub flagged_invalid: usize,             // 提交前预判无效的记录数（仅提示）
}

impl ImportSummary {
    pub fn from_result(result: &ImportResult, max_error_details: usize, flagged_invalid: usize) -> Self {
        let shown_failures: Vec<RecordOutcome> =
            result.failures().take(max_error_details).cloned().collect();
        let remaining_failures = result.errors.saturating_sub(shown_failures.len());

        Self {
            success: result.success,
            skipped: result.skipped,
            errors: result.errors,
            shown_failures,
            remaining_failures,
            flagged_invalid,
        }
    }

    /// 是否存在部分失败 / 跳过（非阻断）
    pub fn is_partial(&self) -> bool {
        self.skipped > 0 || self.errors > 0
    }

    /// 按指定语言渲染多行摘要
    pub fn render(&self, locale: &str) -> String {
        let count = |n: usize| n.to_string();
        let mut lines = vec![
            t_in(locale, "import.summary.title", &[]),
            String::new(),
            t_in(locale, "import.summary.success", &[("count", count(self.success).as_str())]),
            t_in(locale, "import.summary.skipped", &[("count", count(self.skipped).as_str())]),
            t_in(locale, "import.summary.errors", &[("count", count(self.errors).as_str())]),
        ];

        if !self.shown_failures.is_empty() {
            lines.push(String::new());
            lines.push(t_in(
                locale,
                "import.summary.details_header",
                &[("count", count(self.shown_failures.len()).as_str())],
            ));
            let unknown = t_in(locale, "import.summary.unknown_error", &[]);
            for failure in &self.shown_failures {
                lines.push(t_in(
                    locale,
                    "import.summary.detail_line",
                    &[
                        ("key", failure.key_field_value.as_str()),
                        ("message", failure.message.as_deref().unwrap_or(unknown.as_str())),
                    ],
                ));
            }
        }

        if self.remaining_failures > 0 {
            lines.push(String::new());
            lines.push(t_in(
                locale,
                "import.summary.remaining",
                &[("count", count(self.remaining_failures).as_str())],
            ));
        }

        if self.flagged_invalid > 0 {
            lines.push(String::new());
            lines.push(t_in(
                locale,
                "import.summary.flagged_invalid",
                &[("count", count(self.flagged_invalid).as_str())],
            ));
        }

        lines.join("\n")
    }
}

/// 导入错误 → 面向用户的提示
pub fn user_message(err: &ImportError, locale: &str) -> String {
    match err {
        ImportError::UnsupportedFormat(_) => t_in(locale, "import.error.unsupported_format", &[]),
        ImportError::EmptyFile => t_in(locale, "import.error.empty_file", &[]),
        ImportError::FileTooLarge { max_bytes, .. } => {
            let max_mb = (max_bytes / (1024 * 1024)).to_string();
            t_in(locale, "import.error.file_too_large", &[("max", max_mb.as_str())])
        }
        ImportError::FileNotFound(path) => {
            t_in(locale, "import.error.file_not_found", &[("path", path.as_str())])
        }
        ImportError::FileReadError(reason)
        | ImportError::CsvParseError(reason)
        | ImportError::ExcelParseError(reason) => {
            t_in(locale, "import.error.file_read", &[("reason", reason.as_str())])
        }
        ImportError::Cancelled => t_in(locale, "import.error.cancelled", &[]),
        ImportError::MappingIncomplete { missing } => t_in(
            locale,
            "import.error.mapping_incomplete",
            &[("fields", missing.join(", ").as_str())],
        ),
        ImportError::CommitInFlight => t_in(locale, "import.error.commit_in_flight", &[]),
        ImportError::CommitFailed(reason) => {
            t_in(locale, "import.error.commit_failed", &[("reason", reason.as_str())])
        }
        other => t_in(locale, "import.error.generic", &[("reason", other.to_string().as_str())]),
    }
}
