//! JSON Schema tree produced by the adapter

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct JsonSchema {
    /// `$schema` dialect
    pub schema: Option<String>,
    /// `$id`, the artefact's public URL
    pub id: Option<String>,
    pub root: JsonDefinition,
    /// Named definitions referenced as `#/$defs/{name}`
    pub defs: BTreeMap<String, JsonDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonDefinition {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: JsonKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsonKind {
    Object {
        /// In declaration order
        properties: Vec<(String, JsonDefinition)>,
        required: Vec<String>,
    },
    Array {
        items: Box<JsonDefinition>,
        min_items: Option<u32>,
        max_items: Option<u32>,
    },
    String {
        format: Option<&'static str>,
    },
    Integer,
    Number,
    Boolean,
    /// Object of language tag to text
    LanguageMap,
    AnyOf(Vec<JsonDefinition>),
    Ref(String),
    /// No constraint
    Any,
}

impl JsonDefinition {
    pub fn new(kind: JsonKind) -> Self {
        Self {
            title: None,
            description: None,
            kind,
        }
    }

    pub fn string(format: Option<&'static str>) -> Self {
        Self::new(JsonKind::String { format })
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self::new(JsonKind::Ref(target.into()))
    }

    pub fn with_annotation(mut self, title: Option<&str>, description: Option<&str>) -> Self {
        self.title = title.map(str::to_string);
        self.description = description.map(str::to_string);
        self
    }
}
