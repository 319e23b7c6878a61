//! Store operations
//!
//! Operations are plain, serializable events. They carry no behavior; the
//! executor registry decides what each one does to the store.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::resource::{
    AttributeKey, AttributeValue, Attributes, Cardinality, Iri, LanguageString, ResourceType,
};

/// Executor registry key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationTag {
    Create,
    SetAttribute,
    SetOrder,
    Delete,
    SetRoots,
}

impl OperationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::SetAttribute => "set-attribute",
            Self::SetOrder => "set-order",
            Self::Delete => "delete",
            Self::SetRoots => "set-roots",
        }
    }
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to mutate a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    /// Create a resource of `kind`, linked into `owner`
    Create {
        kind: ResourceType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        owner: Option<Iri>,
        #[serde(default)]
        attributes: Attributes,
    },
    /// Replace (or clear, with `None`) one attribute
    SetAttribute {
        target: Iri,
        key: AttributeKey,
        value: Option<AttributeValue>,
    },
    /// Move `moved` after `after` in the owner's parts; `None` moves it first
    SetOrder {
        owner: Iri,
        moved: Iri,
        after: Option<Iri>,
    },
    /// Remove a resource and detach it from its owners
    Delete { target: Iri },
    /// Replace the root classes of a schema
    SetRoots { schema: Iri, roots: Vec<Iri> },
}

impl Operation {
    pub fn tag(&self) -> OperationTag {
        match self {
            Self::Create { .. } => OperationTag::Create,
            Self::SetAttribute { .. } => OperationTag::SetAttribute,
            Self::SetOrder { .. } => OperationTag::SetOrder,
            Self::Delete { .. } => OperationTag::Delete,
            Self::SetRoots { .. } => OperationTag::SetRoots,
        }
    }

    /// Existing resource that determines which store owns this operation.
    /// `None` for creates without an owner.
    pub fn routing_iri(&self) -> Option<&str> {
        match self {
            Self::Create { owner, .. } => owner.as_deref(),
            Self::SetAttribute { target, .. } | Self::Delete { target } => Some(target),
            Self::SetOrder { owner, .. } => Some(owner),
            Self::SetRoots { schema, .. } => Some(schema),
        }
    }

    pub fn create(kind: ResourceType, owner: Option<&str>) -> Self {
        Self::Create {
            kind,
            owner: owner.map(str::to_string),
            attributes: Attributes::new(),
        }
    }

    /// Add an initial attribute to a create operation; no-op for other variants
    pub fn with_attribute(mut self, key: AttributeKey, value: impl Into<AttributeValue>) -> Self {
        if let Self::Create { attributes, .. } = &mut self {
            attributes.insert(key, value.into());
        }
        self
    }

    pub fn set_attribute(target: &str, key: AttributeKey, value: impl Into<AttributeValue>) -> Self {
        Self::SetAttribute {
            target: target.to_string(),
            key,
            value: Some(value.into()),
        }
    }

    pub fn clear_attribute(target: &str, key: AttributeKey) -> Self {
        Self::SetAttribute {
            target: target.to_string(),
            key,
            value: None,
        }
    }

    pub fn set_human_label(target: &str, label: LanguageString) -> Self {
        Self::set_attribute(target, AttributeKey::HumanLabel, label)
    }

    pub fn set_technical_label(target: &str, label: &str) -> Self {
        Self::set_attribute(target, AttributeKey::TechnicalLabel, AttributeValue::Text(label.to_string()))
    }

    pub fn set_datatype(target: &str, datatype: &str) -> Self {
        Self::set_attribute(target, AttributeKey::Datatype, AttributeValue::Iri(datatype.to_string()))
    }

    pub fn set_cardinality(target: &str, cardinality: Cardinality) -> Self {
        Self::set_attribute(target, AttributeKey::Cardinality, cardinality)
    }

    pub fn set_extends(target: &str, parents: Vec<Iri>) -> Self {
        Self::set_attribute(target, AttributeKey::Extends, AttributeValue::IriList(parents))
    }

    pub fn set_order(owner: &str, moved: &str, after: Option<&str>) -> Self {
        Self::SetOrder {
            owner: owner.to_string(),
            moved: moved.to_string(),
            after: after.map(str::to_string),
        }
    }

    pub fn delete(target: &str) -> Self {
        Self::Delete {
            target: target.to_string(),
        }
    }

    pub fn set_roots(schema: &str, roots: Vec<Iri>) -> Self {
        Self::SetRoots {
            schema: schema.to_string(),
            roots,
        }
    }
}
