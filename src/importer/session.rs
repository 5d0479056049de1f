// ==========================================
// 订阅财务后台 - 导入会话
// ==========================================
// 职责: 串联 文件解析结果 → 映射推断 → 映射编辑/预览 → 提交
// 状态机:
//   FileSelected → MappingProposed → MappingEdited* → (Confirmed | Cancelled)
//   Committing 为提交进行中；失败回到 MappingEdited，映射与记录保持不变
// 红线: 映射覆盖不满足时，确认既不改变状态也不调用协作方
// ==========================================

use crate::domain::field::{EntitySchema, FieldSpec};
use crate::domain::mapping::{ColumnMapping, PreviewRow};
use crate::domain::record::RawBatch;
use crate::domain::types::SessionState;
use crate::importer::commit_coordinator::{CommitReport, ImportCommitCoordinator};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::importer_trait::MappingInferrer;
use crate::importer::mapping_editor::{MappingEditor, DEFAULT_PREVIEW_ROWS};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

// ==========================================
// CommitTicket - 脱离会话执行的提交
// ==========================================
// 持有提交所需数据的快照，调用方可在不持有会话锁的情况下 await
pub struct CommitTicket {
    session_id: String,
    schema: EntitySchema,
    mapping: ColumnMapping,
    batch: Arc<RawBatch>,
    coordinator: Arc<ImportCommitCoordinator>,
}

impl CommitTicket {
    /// 发起提交的会话 id
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn run(self) -> ImporterResult<CommitReport> {
        self.coordinator
            .commit(&self.schema, &self.mapping, self.batch.records())
            .await
    }
}

/// Committing 回滚守卫
///
/// 提交 future 在完成前被丢弃（调用方超时 / 断开）时，
/// 将会话从 Committing 退回 MappingEdited，映射与记录不变
struct CommittingGuard<'a> {
    state: &'a mut SessionState,
    armed: bool,
}

impl<'a> CommittingGuard<'a> {
    fn new(state: &'a mut SessionState) -> Self {
        Self { state, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CommittingGuard<'_> {
    fn drop(&mut self) {
        if self.armed && *self.state == SessionState::Committing {
            *self.state = SessionState::MappingEdited;
            warn!("提交被中断，会话回到可编辑状态");
        }
    }
}

// ==========================================
// ImportSession
// ==========================================
pub struct ImportSession {
    id: String,
    state: SessionState,
    source_name: Option<String>,
    editor: MappingEditor,
    coordinator: Arc<ImportCommitCoordinator>,
    preview_rows: usize,
    last_report: Option<CommitReport>,
    created_at: DateTime<Utc>,
}

impl ImportSession {
    /// 文件解析成功后创建会话（状态 FileSelected，映射为空）
    pub fn new(
        schema: EntitySchema,
        batch: Arc<RawBatch>,
        coordinator: Arc<ImportCommitCoordinator>,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        info!(
            session_id = %id,
            entity = %schema.entity,
            total_rows = batch.len(),
            "导入会话已创建"
        );
        Self {
            id,
            state: SessionState::FileSelected,
            source_name: None,
            editor: MappingEditor::new(schema, batch, ColumnMapping::new()),
            coordinator,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            last_report: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_preview_rows(mut self, preview_rows: usize) -> Self {
        self.preview_rows = preview_rows;
        self
    }

    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }

    // ===== 只读访问 =====

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn schema(&self) -> &EntitySchema {
        self.editor.schema()
    }

    pub fn headers(&self) -> &[String] {
        self.editor.batch().headers()
    }

    pub fn total_rows(&self) -> usize {
        self.editor.batch().len()
    }

    pub fn mapping(&self) -> &ColumnMapping {
        self.editor.current_mapping()
    }

    pub fn missing_required_fields(&self) -> Vec<&FieldSpec> {
        self.editor.missing_required_fields()
    }

    pub fn invalid_record_count(&self) -> usize {
        self.editor.invalid_record_count()
    }

    /// 按配置行数生成预览
    pub fn preview(&self) -> Vec<PreviewRow> {
        self.editor.preview(self.preview_rows)
    }

    pub fn last_report(&self) -> Option<&CommitReport> {
        self.last_report.as_ref()
    }

    // ===== 状态转换 =====

    /// FileSelected → MappingProposed
    pub fn propose_mapping(&mut self, inferrer: &dyn MappingInferrer) -> ImporterResult<()> {
        self.expect_state(SessionState::FileSelected, SessionState::MappingProposed)?;

        let seed = inferrer.infer(self.editor.batch().headers(), self.editor.schema());
        self.editor = MappingEditor::new(
            self.editor.schema().clone(),
            Arc::clone(self.editor.batch()),
            seed,
        );
        self.state = SessionState::MappingProposed;

        info!(
            session_id = %self.id,
            mapped = self.editor.current_mapping().len(),
            invalid = self.editor.invalid_record_count(),
            "初始映射已生成"
        );
        Ok(())
    }

    /// 修改单个字段的映射（MappingProposed / MappingEdited → MappingEdited）
    pub fn set_mapping(&mut self, field_key: &str, header: Option<&str>) -> ImporterResult<()> {
        if !self.state.is_editable() {
            return Err(self.invalid_transition(SessionState::MappingEdited));
        }
        self.editor.set_mapping(field_key, header)?;
        self.state = SessionState::MappingEdited;
        Ok(())
    }

    /// 提交前检查并进入 Committing
    ///
    /// # 返回
    /// - Ok(CommitTicket): 可脱离会话执行的提交
    /// - Err(MappingIncomplete): 必填字段未映射（状态不变）
    /// - Err(CommitInFlight): 已在提交中
    pub fn prepare_commit(&mut self) -> ImporterResult<CommitTicket> {
        if self.state == SessionState::Committing {
            return Err(ImportError::CommitInFlight);
        }
        if !self.state.is_editable() {
            return Err(self.invalid_transition(SessionState::Committing));
        }

        if let Err(e) = self.editor.check_coverage() {
            warn!(session_id = %self.id, error = %e, "映射不完整，拒绝提交");
            return Err(e);
        }

        self.state = SessionState::Committing;
        Ok(CommitTicket {
            session_id: self.id.clone(),
            schema: self.editor.schema().clone(),
            mapping: self.editor.current_mapping().clone(),
            batch: Arc::clone(self.editor.batch()),
            coordinator: Arc::clone(&self.coordinator),
        })
    }

    /// 提交结束回写: 成功 → Confirmed；失败 → MappingEdited（可重试）
    pub fn finish_commit(
        &mut self,
        outcome: ImporterResult<CommitReport>,
    ) -> ImporterResult<CommitReport> {
        if self.state != SessionState::Committing {
            return Err(self.invalid_transition(SessionState::Confirmed));
        }

        match outcome {
            Ok(report) => {
                self.state = SessionState::Confirmed;
                self.last_report = Some(report.clone());
                info!(session_id = %self.id, "导入会话已确认");
                Ok(report)
            }
            Err(e) => {
                self.state = SessionState::MappingEdited;
                warn!(session_id = %self.id, error = %e, "提交失败，会话回到可编辑状态");
                Err(e)
            }
        }
    }

    /// 确认导入（prepare → run → finish）
    ///
    /// 返回的 future 若在提交完成前被丢弃，会话回到 MappingEdited
    pub async fn confirm(&mut self) -> ImporterResult<CommitReport> {
        let ticket = self.prepare_commit()?;
        let guard = CommittingGuard::new(&mut self.state);
        let outcome = ticket.run().await;
        guard.disarm();
        self.finish_commit(outcome)
    }

    /// 取消会话（提交进行中不可取消）
    pub fn cancel(&mut self) -> ImporterResult<()> {
        if self.state.is_terminal() || self.state == SessionState::Committing {
            return Err(self.invalid_transition(SessionState::Cancelled));
        }
        self.state = SessionState::Cancelled;
        info!(session_id = %self.id, "导入会话已取消");
        Ok(())
    }

    fn expect_state(&self, expected: SessionState, to: SessionState) -> ImporterResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid_transition(to))
        }
    }

    fn invalid_transition(&self, to: SessionState) -> ImportError {
        ImportError::InvalidState {
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }
}
