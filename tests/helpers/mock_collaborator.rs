// ==========================================
// Mock 持久化服务 - 用于集成测试
// ==========================================
// 行为: 按主键字段逐条裁决
//   - 主键为空 → error
//   - 主键重复 → skipped
//   - 其余     → success
// 可配置前 N 次调用失败，或在响应前等待放行信号
// ==========================================

use async_trait::async_trait;
use backoffice_import::domain::{ImportResult, MappedRecord, RecordOutcome, RecordStatus};
use backoffice_import::importer::CollaboratorError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub struct MockCollaborator {
    key_field: String,
    failures_left: AtomicUsize,
    entered: Arc<Notify>,
    gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<(String, Vec<MappedRecord>)>>,
}

impl MockCollaborator {
    /// 按主键字段裁决的协作方
    pub fn echo(key_field: &str) -> Self {
        Self {
            key_field: key_field.to_string(),
            failures_left: AtomicUsize::new(0),
            entered: Arc::new(Notify::new()),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 前 times 次调用返回 HTTP 500
    pub fn failing_first(key_field: &str, times: usize) -> Self {
        Self::echo(key_field).with_failures(times)
    }

    /// 收到请求后等待 gate 放行再响应
    pub fn gated(key_field: &str, gate: Arc<Notify>) -> Self {
        let mut mock = Self::echo(key_field);
        mock.gate = Some(gate);
        mock
    }

    /// 追加: 前 times 次调用返回 HTTP 500（可与 gated 组合）
    pub fn with_failures(self, times: usize) -> Self {
        self.failures_left.store(times, Ordering::SeqCst);
        self
    }

    /// 收到请求时触发的通知
    pub fn entered(&self) -> Arc<Notify> {
        Arc::clone(&self.entered)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<(String, Vec<MappedRecord>)> {
        self.calls.lock().unwrap().last().cloned()
    }

    fn judge(&self, records: &[MappedRecord]) -> ImportResult {
        let mut seen = HashSet::new();
        let details: Vec<RecordOutcome> = records
            .iter()
            .map(|record| {
                let key = record
                    .get(&self.key_field)
                    .map(|v| v.coerce_to_string())
                    .unwrap_or_default();
                if key.trim().is_empty() {
                    RecordOutcome::new("N/A", RecordStatus::Error, Some("campo obrigatório"))
                } else if !seen.insert(key.clone()) {
                    RecordOutcome::new(&key, RecordStatus::Skipped, Some("já cadastrado"))
                } else {
                    RecordOutcome::new(&key, RecordStatus::Success, None)
                }
            })
            .collect();

        let count = |status: RecordStatus| details.iter().filter(|d| d.status == status).count();
        ImportResult {
            success: count(RecordStatus::Success),
            skipped: count(RecordStatus::Skipped),
            errors: count(RecordStatus::Error),
            details,
        }
    }
}

#[async_trait]
impl backoffice_import::PersistenceCollaborator for MockCollaborator {
    async fn import_records(
        &self,
        entity: &str,
        records: Vec<MappedRecord>,
    ) -> Result<ImportResult, CollaboratorError> {
        self.calls
            .lock()
            .unwrap()
            .push((entity.to_string(), records.clone()));
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(CollaboratorError::Rejected {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }

        Ok(self.judge(&records))
    }
}
