// ==========================================
// 订阅财务后台 - 批量导入API
// ==========================================
// 职责: 导入会话注册表（打开 / 查看 / 修改映射 / 确认 / 取消 / 关闭）
// 说明:
//   - 提交在独立任务中执行且不持有注册表锁，调用方放弃等待不会使会话停留在 Committing
//   - 重复确认由会话状态与提交协调器拒绝
//   - 会话结束（确认成功 / 取消 / 更换文件）即从注册表移除
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ImportConfigReader;
use crate::domain::field::{EntitySchema, FieldSpec};
use crate::domain::import_result::RecordOutcome;
use crate::domain::mapping::{ColumnMapping, PreviewRow};
use crate::domain::types::SessionState;
use crate::i18n::DEFAULT_LOCALE;
use crate::importer::{
    AliasTable, CancelFlag, ColumnMappingInferrer, ImportCommitCoordinator, ImportError,
    ImportSession, PersistenceCollaborator, UniversalFileParser,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

type SessionRegistry = Arc<Mutex<HashMap<String, ImportSession>>>;

/// 会话视图（供界面渲染映射编辑器与预览）
#[derive(Debug, Clone, Serialize)]
pub struct ImportSessionView {
    pub session_id: String,
    pub entity: String,
    /// 源文件名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    pub state: SessionState,
    /// 文件表头（原样）
    pub headers: Vec<String>,
    pub fields: Vec<FieldSpec>,
    pub mapping: ColumnMapping,
    /// 未映射的必填字段 key
    pub missing_required_fields: Vec<String>,
    pub total_rows: usize,
    /// 必填值缺失的记录数（仅提示）
    pub invalid_record_count: usize,
    pub preview: Vec<PreviewRow>,
    /// 映射覆盖满足且会话可编辑
    pub can_confirm: bool,
    pub created_at: DateTime<Utc>,
}

impl ImportSessionView {
    pub fn from_session(session: &ImportSession) -> Self {
        let missing_required_fields: Vec<String> = session
            .missing_required_fields()
            .iter()
            .map(|f| f.key.clone())
            .collect();
        let can_confirm = session.state().is_editable() && missing_required_fields.is_empty();

        Self {
            session_id: session.id().to_string(),
            entity: session.schema().entity.clone(),
            source_name: session.source_name().map(str::to_string),
            state: session.state(),
            headers: session.headers().to_vec(),
            fields: session.schema().fields.clone(),
            mapping: session.mapping().clone(),
            missing_required_fields,
            total_rows: session.total_rows(),
            invalid_record_count: session.invalid_record_count(),
            preview: session.preview(),
            can_confirm,
            created_at: session.created_at(),
        }
    }
}

/// 确认导入响应
#[derive(Debug, Clone, Serialize)]
pub struct ImportConfirmResponse {
    pub session_id: String,
    pub state: SessionState,
    pub success: usize,
    pub skipped: usize,
    pub errors: usize,
    /// 前 N 条失败明细
    pub failures: Vec<RecordOutcome>,
    /// 未逐条列出的失败数
    pub remaining_failures: usize,
    /// 提交前预判无效的记录数
    pub flagged_invalid: usize,
    /// 按配置语言渲染的摘要
    pub summary_text: String,
    /// 导入耗时（毫秒）
    pub elapsed_ms: u64,
}

/// 批量导入API
pub struct ImportApi {
    config: Arc<dyn ImportConfigReader>,
    collaborator: Arc<dyn PersistenceCollaborator>,
    sessions: SessionRegistry,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - collaborator: 外部持久化服务
    pub fn new(
        config: Arc<dyn ImportConfigReader>,
        collaborator: Arc<dyn PersistenceCollaborator>,
    ) -> Self {
        Self {
            config,
            collaborator,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 打开导入会话: 解析文件并生成初始映射
    ///
    /// # 参数
    /// - file_path: 文件路径（.csv / .xlsx）
    /// - entity: 目标实体（usuarios / prospeccao / despesas）
    ///
    /// # 返回
    /// - Ok(ImportSessionView): 状态为 MAPPING_PROPOSED 的会话视图
    /// - Err(ApiError): 实体未知 / 文件不可用
    pub async fn open_session(&self, file_path: &str, entity: &str) -> ApiResult<ImportSessionView> {
        self.open_session_cancellable(file_path, entity, CancelFlag::new())
            .await
    }

    /// 打开导入会话（可通过 CancelFlag 中断解析）
    pub async fn open_session_cancellable(
        &self,
        file_path: &str,
        entity: &str,
        cancel: CancelFlag,
    ) -> ApiResult<ImportSessionView> {
        let locale = self.locale().await;
        let schema = EntitySchema::builtin(entity)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知的导入实体: {}", entity)))?;

        // 1. 解析文件
        let max_bytes = self.config.get_max_file_size_bytes().await.map_err(config_error)?;
        let parser = UniversalFileParser::new().with_max_file_size(max_bytes);
        let batch = parser
            .parse_in_background(PathBuf::from(file_path), cancel)
            .await
            .map_err(|e| ApiError::localized(e, &locale))?;

        // 2. 构造会话
        let overrides = self.config.get_alias_overrides().await.map_err(config_error)?;
        let inferrer =
            ColumnMappingInferrer::new(AliasTable::for_entity(&schema.entity).with_overrides(&overrides));
        let max_error_details = self.config.get_max_error_details().await.map_err(config_error)?;
        let preview_rows = self.config.get_preview_rows().await.map_err(config_error)?;
        let coordinator = Arc::new(
            ImportCommitCoordinator::new(Arc::clone(&self.collaborator))
                .with_max_error_details(max_error_details),
        );

        let mut session = ImportSession::new(schema, Arc::new(batch), coordinator)
            .with_preview_rows(preview_rows);
        if let Some(name) = Path::new(file_path).file_name() {
            session = session.with_source_name(name.to_string_lossy());
        }

        // 3. 推断初始映射
        session
            .propose_mapping(&inferrer)
            .map_err(|e| ApiError::localized(e, &locale))?;

        let view = ImportSessionView::from_session(&session);
        self.sessions
            .lock()
            .await
            .insert(view.session_id.clone(), session);
        Ok(view)
    }

    /// 查看会话
    pub async fn get_session(&self, session_id: &str) -> ApiResult<ImportSessionView> {
        let sessions = self.sessions.lock().await;
        let session = sessions.get(session_id).ok_or_else(|| not_found(session_id))?;
        Ok(ImportSessionView::from_session(session))
    }

    /// 修改映射（header 为 None 表示取消映射）
    pub async fn set_mapping(
        &self,
        session_id: &str,
        field_key: &str,
        header: Option<&str>,
    ) -> ApiResult<ImportSessionView> {
        let locale = self.locale().await;
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(session_id).ok_or_else(|| not_found(session_id))?;
        session
            .set_mapping(field_key, header)
            .map_err(|e| ApiError::localized(e, &locale))?;
        Ok(ImportSessionView::from_session(session))
    }

    /// 确认导入
    ///
    /// 提交在后台任务中运行到结束并回写会话状态；
    /// 即使本调用被丢弃（超时 / 断开），会话也会在协作方返回后离开 Committing
    ///
    /// # 返回
    /// - Ok(ImportConfirmResponse): 计数、失败明细与摘要（会话随即关闭）
    /// - Err(MappingIncomplete): 必填字段未映射（未调用持久化服务）
    /// - Err(CommitInFlight): 该会话已有提交进行中
    /// - Err(CommitFailed): 提交失败，会话回到可编辑状态，可直接重试
    pub async fn confirm_import(&self, session_id: &str) -> ApiResult<ImportConfirmResponse> {
        let locale = self.locale().await;

        // 进入 Committing 后释放锁，提交期间其它会话操作不受阻塞
        let ticket = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.get_mut(session_id).ok_or_else(|| not_found(session_id))?;
            session
                .prepare_commit()
                .map_err(|e| ApiError::localized(e, &locale))?
        };

        let registry = Arc::clone(&self.sessions);
        let handle = tokio::spawn(async move {
            let id = ticket.session_id().to_string();
            let outcome = ticket.run().await;

            let mut sessions = registry.lock().await;
            let finished = match sessions.get_mut(&id) {
                Some(session) => session.finish_commit(outcome),
                None => {
                    warn!(session_id = %id, "提交期间会话已关闭");
                    outcome
                }
            };
            if finished.is_ok() {
                sessions.remove(&id);
            }
            finished
        });

        let report = match handle.await {
            Ok(finished) => finished.map_err(|e| ApiError::localized(e, &locale))?,
            Err(e) => {
                error!(session_id = %session_id, error = %e, "提交任务异常终止");
                return Err(ApiError::InternalError(format!("提交任务异常终止: {}", e)));
            }
        };
        info!(session_id = %session_id, success = report.result.success, "导入已确认");

        Ok(ImportConfirmResponse {
            session_id: session_id.to_string(),
            state: SessionState::Confirmed,
            success: report.summary.success,
            skipped: report.summary.skipped,
            errors: report.summary.errors,
            summary_text: report.summary.render(&locale),
            failures: report.summary.shown_failures,
            remaining_failures: report.summary.remaining_failures,
            flagged_invalid: report.summary.flagged_invalid,
            elapsed_ms: report.elapsed_ms,
        })
    }

    /// 取消会话并从注册表移除，返回取消时的视图
    pub async fn cancel_session(&self, session_id: &str) -> ApiResult<ImportSessionView> {
        let locale = self.locale().await;
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(session_id).ok_or_else(|| not_found(session_id))?;
        session
            .cancel()
            .map_err(|e| ApiError::localized(e, &locale))?;
        let view = ImportSessionView::from_session(session);
        sessions.remove(session_id);
        Ok(view)
    }

    /// 更换文件: 丢弃原会话（映射与数据）并为新文件打开同一实体的会话
    ///
    /// # 返回
    /// - Ok(ImportSessionView): 新会话视图（新的 session_id）
    /// - Err(CommitInFlight): 原会话提交进行中，不可更换
    /// - Err(ImportError): 新文件不可用（原会话已丢弃）
    pub async fn replace_file(
        &self,
        session_id: &str,
        file_path: &str,
    ) -> ApiResult<ImportSessionView> {
        let locale = self.locale().await;
        let entity = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.get(session_id).ok_or_else(|| not_found(session_id))?;
            if session.state() == SessionState::Committing {
                return Err(ApiError::localized(ImportError::CommitInFlight, &locale));
            }
            let entity = session.schema().entity.clone();
            sessions.remove(session_id);
            entity
        };
        info!(session_id = %session_id, file = %file_path, "更换导入文件，原会话已丢弃");
        self.open_session(file_path, &entity).await
    }

    /// 关闭会话并释放解析数据
    pub async fn close_session(&self, session_id: &str) -> ApiResult<()> {
        self.sessions
            .lock()
            .await
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| not_found(session_id))
    }

    /// 当前打开的会话数
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn locale(&self) -> String {
        self.config.get_locale().await.unwrap_or_else(|e| {
            warn!(error = %e, "读取语言配置失败，使用默认语言");
            DEFAULT_LOCALE.to_string()
        })
    }
}

fn not_found(session_id: &str) -> ApiError {
    ApiError::NotFound(format!("导入会话(id={})不存在", session_id))
}

fn config_error(err: Box<dyn std::error::Error + Send + Sync>) -> ApiError {
    ApiError::InternalError(format!("读取配置失败: {}", err))
}
