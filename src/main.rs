// ==========================================
// 订阅财务后台 - 命令行入口
// ==========================================
// 用法:
//   backoffice-import <file> [--entity <name>] [--map field=header]... [--unmap field]...
//
// 解析文件 → 推断映射 → 应用命令行修改 → 以 JSON 输出映射与预览
// 不执行提交（未绑定持久化服务）；Ctrl-C 中断解析
// ==========================================

use anyhow::{anyhow, bail, Context};
use backoffice_import::config::ConfigManager;
use backoffice_import::domain::field::EntitySchema;
use backoffice_import::importer::summary::user_message;
use backoffice_import::importer::{
    AliasTable, CancelFlag, ColumnMappingInferrer, MappingEditor, MappingInferrer,
    UniversalFileParser,
};
use backoffice_import::{logging, APP_NAME, VERSION};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// 解析导入文件并输出推断的列映射与预览（不提交）
#[derive(Parser, Debug)]
#[command(name = "backoffice-import")]
#[command(version, about, long_about = None)]
struct Cli {
    /// 导入文件（.csv / .xlsx）
    file: PathBuf,

    /// 目标实体（usuarios / prospeccao / despesas）
    #[arg(long, default_value = "usuarios")]
    entity: String,

    /// 指定字段映射，格式 field=header，可重复
    #[arg(long = "map", value_name = "FIELD=HEADER", value_parser = parse_pair)]
    map: Vec<(String, String)>,

    /// 取消字段映射，可重复（在 --map 之后应用）
    #[arg(long, value_name = "FIELD")]
    unmap: Vec<String>,
}

impl Cli {
    /// 按应用顺序展开映射修改: 先 --map，后 --unmap
    fn edits(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.map
            .iter()
            .map(|(field, header)| (field.as_str(), Some(header.as_str())))
            .chain(self.unmap.iter().map(|field| (field.as_str(), None)))
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(field, header)| (field.to_string(), header.to_string()))
        .ok_or_else(|| format!("格式应为 field=header: {}", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    tracing::info!("{} v{}", APP_NAME, VERSION);

    let args = Cli::parse();
    let manager = ConfigManager::load().map_err(|e| anyhow!("加载配置失败: {}", e))?;
    let config = manager.config().clone();

    let schema = EntitySchema::builtin(&args.entity)
        .ok_or_else(|| anyhow!("未知的导入实体: {}", args.entity))?;

    // Ctrl-C 取消解析
    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let parser = UniversalFileParser::new()
        .with_max_file_size(config.max_file_size_mb.saturating_mul(1024 * 1024));
    let batch = match parser.parse_in_background(args.file.clone(), cancel).await {
        Ok(batch) => batch,
        Err(e) => bail!(user_message(&e, &config.locale)),
    };

    let inferrer = ColumnMappingInferrer::new(
        AliasTable::for_entity(&schema.entity).with_overrides(&config.alias_overrides),
    );
    let seed = inferrer.infer(batch.headers(), &schema);
    let mut editor = MappingEditor::new(schema, Arc::new(batch), seed);

    for (field, header) in args.edits() {
        editor
            .set_mapping(field, header)
            .map_err(|e| anyhow!(user_message(&e, &config.locale)))
            .with_context(|| format!("修改映射失败: {}", field))?;
    }

    let missing: Vec<&str> = editor
        .missing_required_fields()
        .iter()
        .map(|f| f.key.as_str())
        .collect();
    let coverage = editor
        .check_coverage()
        .err()
        .map(|e| user_message(&e, &config.locale));

    let output = json!({
        "entity": editor.schema().entity,
        "file": args.file.display().to_string(),
        "headers": editor.batch().headers(),
        "fields": editor.schema().fields,
        "mapping": editor.current_mapping(),
        "missing_required_fields": missing,
        "coverage_message": coverage,
        "total_rows": editor.batch().len(),
        "invalid_record_count": editor.invalid_record_count(),
        "preview": editor.preview(config.preview_rows),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_with_edits() {
        let cli = Cli::try_parse_from([
            "backoffice-import",
            "contas.csv",
            "--entity",
            "despesas",
            "--unmap",
            "conta",
            "--map",
            "valor=Valor (R$)",
        ])
        .unwrap();

        assert_eq!(cli.file, PathBuf::from("contas.csv"));
        assert_eq!(cli.entity, "despesas");
        assert_eq!(
            cli.edits().collect::<Vec<_>>(),
            vec![("valor", Some("Valor (R$)")), ("conta", None)]
        );
    }

    #[test]
    fn test_cli_defaults_to_usuarios() {
        let cli = Cli::try_parse_from(["backoffice-import", "u.xlsx"]).unwrap();
        assert_eq!(cli.entity, "usuarios");
        assert_eq!(cli.edits().count(), 0);
    }

    #[test]
    fn test_cli_header_may_contain_equals_sign() {
        let cli =
            Cli::try_parse_from(["backoffice-import", "a.csv", "--map", "valor=a=b"]).unwrap();
        assert_eq!(cli.map, vec![("valor".to_string(), "a=b".to_string())]);
    }

    #[test]
    fn test_cli_rejects_bad_input() {
        assert!(Cli::try_parse_from(["backoffice-import"]).is_err());
        assert!(Cli::try_parse_from(["backoffice-import", "a.csv", "b.csv"]).is_err());
        assert!(Cli::try_parse_from(["backoffice-import", "a.csv", "--map", "valor"]).is_err());
        assert!(Cli::try_parse_from(["backoffice-import", "a.csv", "--verbose"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
