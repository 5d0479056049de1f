// ==========================================
// 订阅财务后台 - 可导入字段描述
// ==========================================
// 职责: FieldSpec / EntitySchema 定义 + 内置实体字段表
// 红线: 字段表在构建期固定，会话期间不变
// ==========================================

use crate::domain::types::FieldType;
use serde::{Deserialize, Serialize};

// ==========================================
// FieldSpec - 单个目标字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,          // 目标实体字段键
    pub label: String,        // 展示名称
    pub required: bool,       // 是否必填
    #[serde(rename = "type")]
    pub field_type: FieldType, // 逻辑类型（仅展示）
}

impl FieldSpec {
    pub fn new(key: &str, label: &str, required: bool, field_type: FieldType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            required,
            field_type,
        }
    }

    /// 必填文本字段
    pub fn required(key: &str, label: &str) -> Self {
        Self::new(key, label, true, FieldType::Text)
    }

    /// 可选文本字段
    pub fn optional(key: &str, label: &str) -> Self {
        Self::new(key, label, false, FieldType::Text)
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }
}

// ==========================================
// EntitySchema - 一个实体的有序字段表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub entity: String,
    pub fields: Vec<FieldSpec>,
}

/// 内置实体名称
pub const ENTITY_USUARIOS: &str = "usuarios";
pub const ENTITY_PROSPECCAO: &str = "prospeccao";
pub const ENTITY_DESPESAS: &str = "despesas";

impl EntitySchema {
    pub fn new(entity: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            entity: entity.to_string(),
            fields,
        }
    }

    /// 按名称取内置字段表（大小写不敏感）
    pub fn builtin(entity: &str) -> Option<Self> {
        match entity.trim().to_lowercase().as_str() {
            ENTITY_USUARIOS => Some(Self::usuarios()),
            ENTITY_PROSPECCAO => Some(Self::prospeccao()),
            ENTITY_DESPESAS => Some(Self::despesas()),
            _ => None,
        }
    }

    /// 用户导入字段表
    pub fn usuarios() -> Self {
        Self::new(
            ENTITY_USUARIOS,
            vec![
                FieldSpec::required("emailLogin", "Email"),
                FieldSpec::optional("nomeCompleto", "Nome Completo"),
                FieldSpec::optional("telefone", "Telefone"),
                FieldSpec::optional("indicador", "Indicador"),
                FieldSpec::optional("obs", "Observações"),
            ],
        )
    }

    /// 潜在客户（prospecção）导入字段表
    pub fn prospeccao() -> Self {
        Self::new(
            ENTITY_PROSPECCAO,
            vec![
                FieldSpec::required("email", "Email"),
                FieldSpec::required("nome", "Nome"),
                FieldSpec::optional("telefone", "Telefone"),
                FieldSpec::optional("origem", "Origem"),
                FieldSpec::optional("indicador", "Indicador"),
            ],
        )
    }

    /// 费用导入字段表
    pub fn despesas() -> Self {
        Self::new(
            ENTITY_DESPESAS,
            vec![
                FieldSpec::required("categoria", "Categoria"),
                FieldSpec::required("descricao", "Descrição"),
                FieldSpec::required("valor", "Valor").with_type(FieldType::Number),
                FieldSpec::optional("conta", "Conta"),
                FieldSpec::optional("indicador", "Indicador"),
                FieldSpec::required("competenciaMes", "Mês de Competência")
                    .with_type(FieldType::Number),
                FieldSpec::required("competenciaAno", "Ano de Competência")
                    .with_type(FieldType::Number),
            ],
        )
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}
