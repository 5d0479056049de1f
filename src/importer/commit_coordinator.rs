// ==========================================
// 订阅财务后台 - 导入提交协调器
// ==========================================
// 职责: 对全批次应用确认后的映射 → 交给外部持久化服务 → 生成摘要
// 约束:
//   - 每个会话同一时间只允许一个提交；进行中再次提交直接拒绝（不排队）
//   - 协作方失败 = 整批未导入，不存在对用户可见的部分提交状态
//   - 客户端预判无效的记录同样提交，由协作方最终裁决
// ==========================================

use crate::domain::field::EntitySchema;
use crate::domain::import_result::ImportResult;
use crate::domain::mapping::{ColumnMapping, MappedRecord};
use crate::domain::record::RawRecord;
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::importer_trait::PersistenceCollaborator;
use crate::importer::record_validator::RecordValidator;
use crate::importer::summary::{ImportSummary, DEFAULT_MAX_ERROR_DETAILS};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// CommitReport - 提交结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    pub result: ImportResult,   // 协作方原始结果
    pub summary: ImportSummary, // 可读摘要
    pub elapsed_ms: u64,        // 提交耗时
}

/// 进行中标志守卫；离开作用域（含 future 被丢弃）时复位
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> ImporterResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlightGuard(flag))
            .map_err(|_| ImportError::CommitInFlight)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ==========================================
// ImportCommitCoordinator
// ==========================================
pub struct ImportCommitCoordinator {
    collaborator: Arc<dyn PersistenceCollaborator>,
    max_error_details: usize,
    in_flight: AtomicBool,
}

impl ImportCommitCoordinator {
    pub fn new(collaborator: Arc<dyn PersistenceCollaborator>) -> Self {
        Self {
            collaborator,
            max_error_details: DEFAULT_MAX_ERROR_DETAILS,
            in_flight: AtomicBool::new(false),
        }
    }

    /// 设置摘要中展示的失败明细条数
    pub fn with_max_error_details(mut self, max_error_details: usize) -> Self {
        self.max_error_details = max_error_details;
        self
    }

    /// 是否有提交正在进行
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// 提交整批记录
    ///
    /// # 参数
    /// - schema: 目标实体字段表
    /// - mapping: 已确认的映射
    /// - records: 全部原始记录（文件顺序）
    ///
    /// # 返回
    /// - Ok(CommitReport): 协作方结果 + 摘要
    /// - Err(CommitInFlight): 已有提交进行中
    /// - Err(CommitFailed): 网络错误 / 非 2xx 响应，整批视为未导入
    #[instrument(skip(self, schema, mapping, records), fields(entity = %schema.entity, total_rows = records.len()))]
    pub async fn commit(
        &self,
        schema: &EntitySchema,
        mapping: &ColumnMapping,
        records: &[RawRecord],
    ) -> ImporterResult<CommitReport> {
        let _guard = InFlightGuard::acquire(&self.in_flight).map_err(|e| {
            warn!("提交进行中，拒绝重复提交");
            e
        })?;
        let start_time = Instant::now();

        // === 步骤 1: 应用映射 ===
        let mapped: Vec<MappedRecord> = records
            .iter()
            .map(|record| MappedRecord::from_record(record, mapping, schema))
            .collect();

        // === 步骤 2: 客户端预判（仅用于摘要提示） ===
        let flagged_invalid = RecordValidator::new(schema).count_invalid(records, mapping);
        debug!(flagged_invalid, "提交前预判完成");

        // === 步骤 3: 交给协作方 ===
        let result = self
            .collaborator
            .import_records(&schema.entity, mapped)
            .await
            .map_err(|e| {
                error!(error = %e, "持久化服务调用失败，整批未导入");
                ImportError::from(e)
            })?;

        let summary = ImportSummary::from_result(&result, self.max_error_details, flagged_invalid);
        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        info!(
            success = result.success,
            skipped = result.skipped,
            errors = result.errors,
            elapsed_ms,
            "批量导入提交完成"
        );

        Ok(CommitReport {
            result,
            summary,
            elapsed_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field::FieldSpec;
    use crate::domain::import_result::RecordOutcome;
    use crate::domain::record::RawBatch;
    use crate::domain::types::{CellValue, RecordStatus};
    use crate::importer::error::CollaboratorError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    struct EchoCollaborator {
        received: Mutex<Vec<MappedRecord>>,
    }

    #[async_trait]
    impl PersistenceCollaborator for EchoCollaborator {
        async fn import_records(
            &self,
            _entity: &str,
            records: Vec<MappedRecord>,
        ) -> Result<ImportResult, CollaboratorError> {
            let details = records
                .iter()
                .map(|r| {
                    let key = r.get("email").map(|v| v.to_string()).unwrap_or_default();
                    if key.is_empty() {
                        RecordOutcome::new("N/A", RecordStatus::Error, Some("Email é obrigatório"))
                    } else {
                        RecordOutcome::new(&key, RecordStatus::Success, None)
                    }
                })
                .collect::<Vec<_>>();
            let errors = details.iter().filter(|d| d.status == RecordStatus::Error).count();
            *self.received.lock().unwrap() = records;
            Ok(ImportResult {
                success: details.len() - errors,
                skipped: 0,
                errors,
                details,
            })
        }
    }

    struct BlockingCollaborator {
        release: Notify,
    }

    #[async_trait]
    impl PersistenceCollaborator for BlockingCollaborator {
        async fn import_records(
            &self,
            _entity: &str,
            records: Vec<MappedRecord>,
        ) -> Result<ImportResult, CollaboratorError> {
            self.release.notified().await;
            Ok(ImportResult {
                success: records.len(),
                ..Default::default()
            })
        }
    }

    fn fixture() -> (EntitySchema, ColumnMapping, RawBatch) {
        let schema = EntitySchema::new("t", vec![FieldSpec::required("email", "Email")]);
        let mapping: ColumnMapping = [("email", "E-mail")].into_iter().collect();
        let batch = RawBatch::from_rows(
            ["E-mail"],
            vec![vec![CellValue::text("a@b.com")], vec![CellValue::text("")]],
        );
        (schema, mapping, batch)
    }

    #[tokio::test]
    async fn test_commit_sends_all_records_including_invalid() {
        let collaborator = Arc::new(EchoCollaborator {
            received: Mutex::new(Vec::new()),
        });
        let coordinator = ImportCommitCoordinator::new(collaborator.clone());
        let (schema, mapping, batch) = fixture();

        let report = coordinator
            .commit(&schema, &mapping, batch.records())
            .await
            .unwrap();

        assert_eq!(collaborator.received.lock().unwrap().len(), 2);
        assert_eq!(report.result.success, 1);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.flagged_invalid, 1);
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test]
    async fn test_second_commit_while_pending_is_rejected() {
        let collaborator = Arc::new(BlockingCollaborator {
            release: Notify::new(),
        });
        let coordinator = ImportCommitCoordinator::new(collaborator.clone());
        let (schema, mapping, batch) = fixture();

        let first = coordinator.commit(&schema, &mapping, batch.records());
        let second = async {
            // 让第一个提交先进入等待
            tokio::task::yield_now().await;
            let result = coordinator.commit(&schema, &mapping, batch.records()).await;
            collaborator.release.notify_one();
            result
        };

        let (first, second) = tokio::join!(first, second);
        assert!(first.is_ok());
        assert!(matches!(second, Err(ImportError::CommitInFlight)));
        assert!(!coordinator.is_in_flight());
    }
}
