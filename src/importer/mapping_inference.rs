// ==========================================
// 订阅财务后台 - 列映射推断引擎
// ==========================================
// 职责: 文件表头 + 字段表 → 初始 ColumnMapping（零交互）
// 规则（逐字段，按层级，先命中者胜）:
//   1. 精确匹配: 表头（忽略大小写）== key 或 label
//   2. 标准化匹配: 去空白/连字符/下划线并小写后 == 标准化 key
//   3. 别名匹配: 标准化表头 ∈ 标准化别名集合
//   4. 未命中: 保持未映射
// 同一层级内按文件表头顺序取第一个；已被前序字段占用的表头仍可复用
// ==========================================

use crate::domain::field::{EntitySchema, FieldSpec};
use crate::domain::mapping::ColumnMapping;
use crate::importer::alias_table::AliasTable;
use crate::importer::importer_trait::MappingInferrer;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 标准化: 去除空白、连字符、下划线并转小写
pub fn normalize_header(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

// ==========================================
// MatchTier - 命中层级
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Exact,
    Normalized,
    Alias,
}

/// 单个字段的推断结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredBinding {
    pub field_key: String,
    pub header: String,
    pub tier: MatchTier,
}

// ==========================================
// ColumnMappingInferrer
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ColumnMappingInferrer {
    aliases: AliasTable,
}

impl ColumnMappingInferrer {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    /// 使用内置别名表
    pub fn for_entity(entity: &str) -> Self {
        Self::new(AliasTable::for_entity(entity))
    }

    /// 推断并给出每个字段的命中层级
    pub fn infer_bindings(&self, headers: &[String], schema: &EntitySchema) -> Vec<InferredBinding> {
        schema
            .fields
            .iter()
            .filter_map(|field| {
                let binding = self.match_field(headers, field);
                match &binding {
                    Some(b) => debug!(field = %field.key, header = %b.header, tier = ?b.tier, "列映射命中"),
                    None => debug!(field = %field.key, "列映射未命中"),
                }
                binding
            })
            .collect()
    }

    fn match_field(&self, headers: &[String], field: &FieldSpec) -> Option<InferredBinding> {
        let bind = |header: &String, tier| InferredBinding {
            field_key: field.key.clone(),
            header: header.clone(),
            tier,
        };

        // 1. 精确匹配（忽略大小写）
        let key_lower = field.key.to_lowercase();
        let label_lower = field.label.to_lowercase();
        if let Some(header) = headers.iter().find(|h| {
            let lower = h.to_lowercase();
            lower == key_lower || lower == label_lower
        }) {
            return Some(bind(header, MatchTier::Exact));
        }

        // 2. 标准化匹配
        let key_normalized = normalize_header(&field.key);
        if let Some(header) = headers
            .iter()
            .find(|h| normalize_header(h) == key_normalized)
        {
            return Some(bind(header, MatchTier::Normalized));
        }

        // 3. 别名匹配
        let aliases: Vec<String> = self
            .aliases
            .aliases_for(&field.key)
            .iter()
            .map(|a| normalize_header(a))
            .collect();
        if aliases.is_empty() {
            return None;
        }
        headers
            .iter()
            .find(|h| aliases.contains(&normalize_header(h)))
            .map(|header| bind(header, MatchTier::Alias))
    }
}

impl MappingInferrer for ColumnMappingInferrer {
    fn infer(&self, headers: &[String], schema: &EntitySchema) -> ColumnMapping {
        self.infer_bindings(headers, schema)
            .into_iter()
            .map(|b| (b.field_key, b.header))
            .collect()
    }
}
