use serde::{Deserialize, Serialize};

/// Key participation of a column, reduced to what every engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    None,
    Primary,
    Unique,
    /// Part of a non-unique index (MySQL `MUL`).
    Index,
}

/// Column metadata returned by table introspection.
///
/// The shape follows the classic Field/Type/Null/Key/Default/Extra layout
/// of `SHOW COLUMNS`, normalized across engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub ordinal_position: i32,
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub key: KeyRole,
    pub default: Option<String>,
    /// Engine-specific attributes (`auto_increment`, identity, generated).
    pub extra: Option<String>,
}
