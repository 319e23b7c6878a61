//! CSV on the Web metadata tree

use serde::Serialize;
use serde_json::Value;

pub const CSVW_CONTEXT: &str = "http://www.w3.org/ns/csvw";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CsvSchema {
    Single(SingleTableSchema),
    Multiple(MultipleTableSchema),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleTableSchema {
    #[serde(rename = "@context")]
    pub context: Value,
    #[serde(flatten)]
    pub table: Table,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultipleTableSchema {
    #[serde(rename = "@context")]
    pub context: Value,
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(rename = "@id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub url: String,
    pub table_schema: TableSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub columns: Vec<Column>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titles: Option<String>,
    #[serde(rename = "dc:title", skip_serializing_if = "Option::is_none")]
    pub dc_title: Option<Value>,
    #[serde(rename = "dc:description", skip_serializing_if = "Option::is_none")]
    pub dc_description: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(rename = "virtual", skip_serializing_if = "std::ops::Not::not")]
    pub is_virtual: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub column_reference: String,
    pub reference: Reference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub resource: String,
    pub column_reference: String,
}
