// ==========================================
// 导入管道端到端测试
// ==========================================
// 文件 → 解析 → 映射推断 → 映射编辑/预览 → 会话提交

mod helpers;

use backoffice_import::domain::{CellValue, ColumnMapping, EntitySchema, FieldSpec, SessionState};
use backoffice_import::importer::{
    ColumnMappingInferrer, ImportCommitCoordinator, ImportError, ImportSession, MappingEditor,
    MappingInferrer, UniversalFileParser,
};
use helpers::mock_collaborator::MockCollaborator;
use std::sync::Arc;
use test_helpers::create_csv_file;

/// 三字段用户表: emailLogin*, nomeCompleto*, telefone
fn users_schema() -> EntitySchema {
    EntitySchema::new(
        "usuarios",
        vec![
            FieldSpec::required("emailLogin", "Email"),
            FieldSpec::required("nomeCompleto", "Nome Completo"),
            FieldSpec::optional("telefone", "Telefone"),
        ],
    )
}

fn editor_for(csv: &str) -> MappingEditor {
    let (_file, path) = create_csv_file(csv);
    let batch = UniversalFileParser::new().parse(&path).unwrap();
    let schema = users_schema();
    let seed = ColumnMappingInferrer::for_entity("usuarios").infer(batch.headers(), &schema);
    MappingEditor::new(schema, Arc::new(batch), seed)
}

#[test]
fn test_complete_file_maps_and_previews_cleanly() {
    let editor = editor_for("Email,Nome,Telefone\na@b.com,Ana,11999990000\n");

    let expected: ColumnMapping = [
        ("emailLogin", "Email"),
        ("nomeCompleto", "Nome"),
        ("telefone", "Telefone"),
    ]
    .into_iter()
    .collect();
    assert_eq!(editor.current_mapping(), &expected);
    assert_eq!(editor.invalid_record_count(), 0);

    let preview = editor.preview(5);
    assert_eq!(preview.len(), 1);
    let row = &preview[0];
    assert!(row.valid);
    assert_eq!(row.values.get("emailLogin"), Some(&CellValue::text("a@b.com")));
    assert_eq!(row.values.get("nomeCompleto"), Some(&CellValue::text("Ana")));
    assert_eq!(row.values.get("telefone"), Some(&CellValue::text("11999990000")));
}

#[test]
fn test_blank_required_value_is_a_data_gap_not_a_mapping_gap() {
    let editor = editor_for("Email,Nome\nx@y.com,\n");

    assert!(editor.missing_required_fields().is_empty());
    assert!(editor.check_coverage().is_ok());
    assert_eq!(editor.invalid_record_count(), 1);
    assert!(!editor.preview(5)[0].valid);
    assert!(!editor.current_mapping().is_mapped("telefone"));
}

#[test]
fn test_alias_resolution_without_label_match() {
    let (_file, path) = create_csv_file("e-mail,Full Name\nana@b.com,Ana\n");
    let batch = UniversalFileParser::new().parse(&path).unwrap();
    let schema = EntitySchema::new("usuarios", vec![FieldSpec::required("emailLogin", "Email")]);

    let mapping = ColumnMappingInferrer::for_entity("usuarios").infer(batch.headers(), &schema);
    assert_eq!(mapping.get("emailLogin"), Some("e-mail"));
}

#[test]
fn test_inference_is_deterministic() {
    let headers: Vec<String> = ["Telefone", "E-mail", "nome completo", "Observações"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let schema = EntitySchema::usuarios();
    let inferrer = ColumnMappingInferrer::for_entity("usuarios");

    let first = inferrer.infer(&headers, &schema);
    for _ in 0..10 {
        assert_eq!(inferrer.infer(&headers, &schema), first);
    }
}

#[test]
fn test_bom_and_blank_rows_are_tolerated() {
    let editor = editor_for("\u{feff}Email,Nome\na@b.com,Ana\n,\nc@d.com,Caio\n");
    assert_eq!(editor.batch().headers(), &["Email", "Nome"]);
    assert_eq!(editor.batch().len(), 2);
    assert_eq!(editor.current_mapping().get("emailLogin"), Some("Email"));
}

#[test]
fn test_unsupported_format_fails_before_mapping() {
    let (_file, path) = test_helpers::create_temp_file(".txt", b"Email\na@b.com\n");
    let err = UniversalFileParser::new().parse(&path).unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_header_only_file_is_empty() {
    let (_file, path) = create_csv_file("Email,Nome\n");
    let err = UniversalFileParser::new().parse(&path).unwrap_err();
    assert!(matches!(err, ImportError::EmptyFile));
}

#[tokio::test]
async fn test_session_commits_every_record_including_flagged_ones() {
    let (_file, path) = create_csv_file("Email,Nome\na@b.com,Ana\nx@y.com,\na@b.com,Ana\n");
    let batch = UniversalFileParser::new().parse(&path).unwrap();
    let collaborator = Arc::new(MockCollaborator::echo("emailLogin"));
    let coordinator = Arc::new(ImportCommitCoordinator::new(collaborator.clone()));
    let mut session = ImportSession::new(users_schema(), Arc::new(batch), coordinator);

    session
        .propose_mapping(&ColumnMappingInferrer::for_entity("usuarios"))
        .unwrap();
    assert_eq!(session.invalid_record_count(), 1);

    let report = session.confirm().await.unwrap();
    assert_eq!(session.state(), SessionState::Confirmed);

    let (entity, records) = collaborator.last_call().unwrap();
    assert_eq!(entity, "usuarios");
    assert_eq!(records.len(), 3);
    // 空字符串照常转发，由协作方裁决
    assert_eq!(records[1].get("nomeCompleto"), Some(&CellValue::text("")));
    // 未映射字段不出现在转换后的记录中
    assert!(records[0].get("telefone").is_none());

    assert_eq!(report.result.success, 2);
    assert_eq!(report.result.skipped, 1);
    assert_eq!(report.summary.flagged_invalid, 1);
}

#[tokio::test]
async fn test_coverage_gate_never_reaches_collaborator() {
    let (_file, path) = create_csv_file("Email,Telefone\na@b.com,1199\n");
    let batch = UniversalFileParser::new().parse(&path).unwrap();
    let collaborator = Arc::new(MockCollaborator::echo("emailLogin"));
    let coordinator = Arc::new(ImportCommitCoordinator::new(collaborator.clone()));
    let mut session = ImportSession::new(users_schema(), Arc::new(batch), coordinator);
    session
        .propose_mapping(&ColumnMappingInferrer::for_entity("usuarios"))
        .unwrap();

    // nomeCompleto 无对应列
    for _ in 0..3 {
        match session.confirm().await {
            Err(ImportError::MappingIncomplete { missing }) => {
                assert_eq!(missing, vec!["Nome Completo".to_string()])
            }
            other => panic!("Expected MappingIncomplete, got {:?}", other.map(|_| ())),
        }
        assert_eq!(session.state(), SessionState::MappingProposed);
    }
    assert_eq!(collaborator.call_count(), 0);

    // 用户把同一列映射给两个字段后可以确认
    session.set_mapping("nomeCompleto", Some("Email")).unwrap();
    session.confirm().await.unwrap();
    assert_eq!(collaborator.call_count(), 1);
}

#[tokio::test]
async fn test_collaborator_failure_keeps_mapping_and_records() {
    let (_file, path) = create_csv_file("Email,Nome\na@b.com,Ana\nc@d.com,Caio\n");
    let batch = Arc::new(UniversalFileParser::new().parse(&path).unwrap());
    let collaborator = Arc::new(MockCollaborator::failing_first("emailLogin", 1));
    let coordinator = Arc::new(ImportCommitCoordinator::new(collaborator.clone()));
    let mut session = ImportSession::new(users_schema(), Arc::clone(&batch), coordinator);
    session
        .propose_mapping(&ColumnMappingInferrer::for_entity("usuarios"))
        .unwrap();
    session.set_mapping("telefone", None).unwrap();
    let mapping_before = session.mapping().clone();

    let err = session.confirm().await.unwrap_err();
    assert!(matches!(err, ImportError::CommitFailed(_)));
    assert_eq!(session.state(), SessionState::MappingEdited);
    assert_eq!(session.mapping(), &mapping_before);
    assert_eq!(session.total_rows(), batch.len());

    let report = session.confirm().await.unwrap();
    assert_eq!(report.result.success, 2);
    assert_eq!(collaborator.call_count(), 2);
}
