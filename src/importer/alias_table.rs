// ==========================================
// 订阅财务后台 - 字段别名表
// ==========================================
// 职责: 字段键 → 已知同义列名集合（静态表 + 配置追加）
// ==========================================

use crate::domain::field::{ENTITY_DESPESAS, ENTITY_PROSPECCAO, ENTITY_USUARIOS};
use std::collections::HashMap;

// ==========================================
// 内置别名表
// ==========================================
const USUARIOS_ALIASES: &[(&str, &[&str])] = &[
    ("emailLogin", &["email", "e-mail", "email_login", "emaillogin"]),
    ("nomeCompleto", &["nome", "nome completo", "nome_completo", "nomecompleto"]),
    ("telefone", &["telefone", "tel", "celular", "phone"]),
    ("indicador", &["indicador", "indicado por", "indicado_por"]),
    ("obs", &["obs", "observacao", "observação", "observacoes", "observações", "notas"]),
];

const PROSPECCAO_ALIASES: &[(&str, &[&str])] = &[
    ("email", &["e-mail", "email_login", "emaillogin"]),
    ("nome", &["nome completo", "nome_completo", "nomecompleto", "name"]),
    ("telefone", &["tel", "celular", "phone", "whatsapp"]),
    ("origem", &["fonte", "canal", "source"]),
    ("indicador", &["indicado por", "indicado_por"]),
];

const DESPESAS_ALIASES: &[(&str, &[&str])] = &[
    ("categoria", &["tipo", "category"]),
    ("descricao", &["descrição", "description", "historico", "histórico"]),
    ("valor", &["valor (r$)", "montante", "amount", "value"]),
    ("conta", &["conta bancaria", "conta bancária", "account"]),
    ("competenciaMes", &["mes", "mês", "competencia mes", "month"]),
    ("competenciaAno", &["ano", "competencia ano", "year"]),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置实体的静态别名表；未知实体返回空表
    pub fn for_entity(entity: &str) -> Self {
        let entries: &[(&str, &[&str])] = match entity.trim().to_lowercase().as_str() {
            ENTITY_USUARIOS => USUARIOS_ALIASES,
            ENTITY_PROSPECCAO => PROSPECCAO_ALIASES,
            ENTITY_DESPESAS => DESPESAS_ALIASES,
            _ => &[],
        };

        let mut table = Self::new();
        for (key, aliases) in entries {
            table.extend(key, aliases.iter().map(|a| a.to_string()));
        }
        table
    }

    /// 追加别名（保持顺序，去重）
    pub fn extend<I>(&mut self, field_key: &str, aliases: I)
    where
        I: IntoIterator<Item = String>,
    {
        let entry = self.aliases.entry(field_key.to_string()).or_default();
        for alias in aliases {
            if !entry.contains(&alias) {
                entry.push(alias);
            }
        }
    }

    /// 合并配置中的别名覆盖
    pub fn with_overrides(mut self, overrides: &HashMap<String, Vec<String>>) -> Self {
        // 排序保证合并结果与 HashMap 遍历顺序无关
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();
        for key in keys {
            self.extend(key, overrides[key].iter().cloned());
        }
        self
    }

    pub fn aliases_for(&self, field_key: &str) -> &[String] {
        self.aliases
            .get(field_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usuarios_email_aliases() {
        let table = AliasTable::for_entity("usuarios");
        assert!(table.aliases_for("emailLogin").contains(&"e-mail".to_string()));
        assert!(table.aliases_for("inexistente").is_empty());
    }

    #[test]
    fn test_overrides_append_without_duplicates() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "telefone".to_string(),
            vec!["fone".to_string(), "tel".to_string()],
        );
        let table = AliasTable::for_entity("usuarios").with_overrides(&overrides);
        let aliases = table.aliases_for("telefone");
        assert_eq!(aliases.last().map(String::as_str), Some("fone"));
        assert_eq!(aliases.iter().filter(|a| a.as_str() == "tel").count(), 1);
    }

    #[test]
    fn test_unknown_entity_is_empty() {
        assert_eq!(AliasTable::for_entity("pagamentos"), AliasTable::new());
    }
}
