//! IRI-addressed resources
//!
//! A resource is a flat record: an immutable IRI, an append-only set of role
//! tags and a map of typed attributes. Role checks are membership tests on the
//! tag set; "as-kind" access goes through [`Resource::require`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Internationalized resource identifier
pub type Iri = String;

// =============================================================================
// Resource Types
// =============================================================================

/// Role tag carried by a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    ConceptualSchema,
    ConceptualClass,
    ConceptualAttribute,
    ConceptualAssociation,
    ConceptualAssociationEnd,
    StructuralSchema,
    StructuralClass,
    StructuralAttribute,
    StructuralAssociationEnd,
    StructuralClassReference,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConceptualSchema => "conceptual-schema",
            Self::ConceptualClass => "conceptual-class",
            Self::ConceptualAttribute => "conceptual-attribute",
            Self::ConceptualAssociation => "conceptual-association",
            Self::ConceptualAssociationEnd => "conceptual-association-end",
            Self::StructuralSchema => "structural-schema",
            Self::StructuralClass => "structural-class",
            Self::StructuralAttribute => "structural-attribute",
            Self::StructuralAssociationEnd => "structural-association-end",
            Self::StructuralClassReference => "structural-class-reference",
        }
    }

    /// Path segment used when minting identifiers for this kind
    pub fn segment(&self) -> &'static str {
        match self {
            Self::ConceptualSchema => "schema",
            Self::ConceptualClass => "class",
            Self::ConceptualAttribute => "attribute",
            Self::ConceptualAssociation => "association",
            Self::ConceptualAssociationEnd => "association-end",
            Self::StructuralSchema => "psm-schema",
            Self::StructuralClass => "psm-class",
            Self::StructuralAttribute => "psm-attribute",
            Self::StructuralAssociationEnd => "psm-association-end",
            Self::StructuralClassReference => "psm-class-reference",
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::ConceptualSchema | Self::StructuralSchema)
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Self::ConceptualClass | Self::StructuralClass)
    }

    pub fn is_conceptual(&self) -> bool {
        matches!(
            self,
            Self::ConceptualSchema
                | Self::ConceptualClass
                | Self::ConceptualAttribute
                | Self::ConceptualAssociation
                | Self::ConceptualAssociationEnd
        )
    }

    /// Schema tag of the same layer
    pub fn schema_type(&self) -> ResourceType {
        if self.is_conceptual() {
            Self::ConceptualSchema
        } else {
            Self::StructuralSchema
        }
    }

    /// Class tag of the same layer
    pub fn class_type(&self) -> ResourceType {
        if self.is_conceptual() {
            Self::ConceptualClass
        } else {
            Self::StructuralClass
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Attribute names understood by executors and model builders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeKey {
    HumanLabel,
    HumanDescription,
    TechnicalLabel,
    /// Conceptual counterpart of a structural resource
    Interpretation,
    /// Concept IRI of a conceptual class or property
    ConceptIri,
    Owner,
    Schema,
    Parts,
    Roots,
    Extends,
    Datatype,
    /// Range of an association end: class, class reference or datatype IRIs
    Range,
    /// Participants of a conceptual association, only accepted on create
    Ends,
    Cardinality,
    IsCodelist,
    Dematerialize,
    BaseIri,
    Namespace,
    NamespacePrefix,
    ReferencedSchema,
    ReferencedClass,
}

impl AttributeKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HumanLabel => "human-label",
            Self::HumanDescription => "human-description",
            Self::TechnicalLabel => "technical-label",
            Self::Interpretation => "interpretation",
            Self::ConceptIri => "concept-iri",
            Self::Owner => "owner",
            Self::Schema => "schema",
            Self::Parts => "parts",
            Self::Roots => "roots",
            Self::Extends => "extends",
            Self::Datatype => "datatype",
            Self::Range => "range",
            Self::Ends => "ends",
            Self::Cardinality => "cardinality",
            Self::IsCodelist => "is-codelist",
            Self::Dematerialize => "dematerialize",
            Self::BaseIri => "base-iri",
            Self::Namespace => "namespace",
            Self::NamespacePrefix => "namespace-prefix",
            Self::ReferencedSchema => "referenced-schema",
            Self::ReferencedClass => "referenced-class",
        }
    }

    /// Links maintained by the store itself; not writable through set-attribute
    pub fn is_structural_link(&self) -> bool {
        matches!(self, Self::Owner | Self::Schema | Self::Parts | Self::Roots | Self::Ends)
    }

    /// Whether `value` has the shape this attribute stores
    pub fn accepts(&self, value: &AttributeValue) -> bool {
        use AttributeValue as V;
        match self {
            Self::HumanLabel | Self::HumanDescription => matches!(value, V::LanguageString(_)),
            Self::TechnicalLabel | Self::BaseIri | Self::Namespace | Self::NamespacePrefix => {
                matches!(value, V::Text(_))
            }
            Self::Interpretation
            | Self::ConceptIri
            | Self::Owner
            | Self::Schema
            | Self::Datatype
            | Self::ReferencedSchema
            | Self::ReferencedClass => matches!(value, V::Iri(_)),
            Self::Parts | Self::Roots | Self::Extends | Self::Range | Self::Ends => {
                matches!(value, V::IriList(_))
            }
            Self::Cardinality => matches!(value, V::Cardinality(_)),
            Self::IsCodelist | Self::Dematerialize => matches!(value, V::Flag(_)),
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text keyed by language tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageString(BTreeMap<String, String>);

impl LanguageString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-language constructor
    pub fn of(language: &str, text: &str) -> Self {
        Self::new().with(language, text)
    }

    pub fn with(mut self, language: &str, text: &str) -> Self {
        self.0.insert(language.to_string(), text.to_string());
        self
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.0.get(language).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Text in the first preferred language present, else any language
    pub fn select(&self, preferred: &[String]) -> Option<&str> {
        preferred
            .iter()
            .find_map(|language| self.get(language))
            .or_else(|| self.0.values().next().map(String::as_str))
    }
}

/// Lower and upper bound of a property; `max == None` means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    pub min: u32,
    pub max: Option<u32>,
}

impl Cardinality {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn exactly_one() -> Self {
        Self::new(1, Some(1))
    }

    pub fn is_required(&self) -> bool {
        self.min >= 1
    }

    /// More than one value may occur
    pub fn is_multiple(&self) -> bool {
        self.max.map_or(true, |max| max > 1)
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::new(0, None)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

/// Typed attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum AttributeValue {
    Text(String),
    LanguageString(LanguageString),
    Iri(Iri),
    IriList(Vec<Iri>),
    Integer(i64),
    Flag(bool),
    Cardinality(Cardinality),
}

impl From<LanguageString> for AttributeValue {
    fn from(value: LanguageString) -> Self {
        Self::LanguageString(value)
    }
}

impl From<Cardinality> for AttributeValue {
    fn from(value: Cardinality) -> Self {
        Self::Cardinality(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Attribute map as carried by resources and create operations
pub type Attributes = BTreeMap<AttributeKey, AttributeValue>;

// =============================================================================
// Resource
// =============================================================================

/// A typed, IRI-addressed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    iri: Iri,
    types: Vec<ResourceType>,
    #[serde(default)]
    attributes: Attributes,
}

impl Resource {
    pub fn new(iri: impl Into<Iri>, kind: ResourceType) -> Self {
        Self {
            iri: iri.into(),
            types: vec![kind],
            attributes: Attributes::new(),
        }
    }

    pub fn iri(&self) -> &str {
        &self.iri
    }

    pub fn types(&self) -> &[ResourceType] {
        &self.types
    }

    /// Primary (first assigned) role
    pub fn kind(&self) -> Option<ResourceType> {
        self.types.first().copied()
    }

    pub fn is(&self, kind: ResourceType) -> bool {
        self.types.contains(&kind)
    }

    /// Grant an additional role. Roles are never removed.
    pub fn add_type(&mut self, kind: ResourceType) {
        if !self.is(kind) {
            self.types.push(kind);
        }
    }

    /// View this resource as `kind`, failing when the role is absent
    pub fn require(&self, kind: ResourceType) -> StoreResult<&Self> {
        if self.is(kind) {
            Ok(self)
        } else {
            Err(StoreError::InvalidReference(format!(
                "{} is not a {}",
                self.iri, kind
            )))
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, key: AttributeKey) -> Option<&AttributeValue> {
        self.attributes.get(&key)
    }

    pub fn set(&mut self, key: AttributeKey, value: AttributeValue) {
        self.attributes.insert(key, value);
    }

    pub fn remove(&mut self, key: AttributeKey) -> Option<AttributeValue> {
        self.attributes.remove(&key)
    }

    /// Builder-style setter
    pub fn with(mut self, key: AttributeKey, value: impl Into<AttributeValue>) -> Self {
        self.set(key, value.into());
        self
    }

    pub fn text(&self, key: AttributeKey) -> Option<&str> {
        match self.get(key) {
            Some(AttributeValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn language_string(&self, key: AttributeKey) -> Option<&LanguageString> {
        match self.get(key) {
            Some(AttributeValue::LanguageString(value)) => Some(value),
            _ => None,
        }
    }

    pub fn iri_ref(&self, key: AttributeKey) -> Option<&str> {
        match self.get(key) {
            Some(AttributeValue::Iri(iri)) => Some(iri),
            _ => None,
        }
    }

    /// Ordered IRI list; empty when absent
    pub fn iri_list(&self, key: AttributeKey) -> &[Iri] {
        match self.get(key) {
            Some(AttributeValue::IriList(list)) => list,
            _ => &[],
        }
    }

    pub fn integer(&self, key: AttributeKey) -> Option<i64> {
        match self.get(key) {
            Some(AttributeValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn flag(&self, key: AttributeKey) -> bool {
        matches!(self.get(key), Some(AttributeValue::Flag(true)))
    }

    pub fn cardinality(&self) -> Option<Cardinality> {
        match self.get(AttributeKey::Cardinality) {
            Some(AttributeValue::Cardinality(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn parts(&self) -> &[Iri] {
        self.iri_list(AttributeKey::Parts)
    }

    /// Edit the list stored under `key`, creating it when absent
    pub(crate) fn update_iri_list<R>(
        &mut self,
        key: AttributeKey,
        edit: impl FnOnce(&mut Vec<Iri>) -> R,
    ) -> R {
        let mut list = match self.attributes.remove(&key) {
            Some(AttributeValue::IriList(list)) => list,
            _ => Vec::new(),
        };
        let result = edit(&mut list);
        self.attributes.insert(key, AttributeValue::IriList(list));
        result
    }

    /// Remove `iri` from the list stored under `key`; true if it was present
    pub(crate) fn detach(&mut self, key: AttributeKey, iri: &str) -> bool {
        if !self.iri_list(key).iter().any(|item| item == iri) {
            return false;
        }
        self.update_iri_list(key, |list| list.retain(|item| item != iri));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_append_only() {
        let mut resource = Resource::new("http://localhost/class/1", ResourceType::ConceptualClass);
        resource.add_type(ResourceType::ConceptualClass);
        resource.add_type(ResourceType::StructuralClass);
        assert_eq!(
            resource.types(),
            &[ResourceType::ConceptualClass, ResourceType::StructuralClass]
        );
        assert_eq!(resource.kind(), Some(ResourceType::ConceptualClass));
    }

    #[test]
    fn test_require_missing_role() {
        let resource = Resource::new("http://localhost/class/1", ResourceType::ConceptualClass);
        assert!(resource.require(ResourceType::ConceptualClass).is_ok());
        assert!(matches!(
            resource.require(ResourceType::StructuralSchema),
            Err(StoreError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_typed_getters_ignore_other_shapes() {
        let resource = Resource::new("x", ResourceType::StructuralAttribute)
            .with(AttributeKey::TechnicalLabel, AttributeValue::Text("name".into()))
            .with(AttributeKey::Cardinality, Cardinality::exactly_one());
        assert_eq!(resource.text(AttributeKey::TechnicalLabel), Some("name"));
        assert!(resource.iri_ref(AttributeKey::TechnicalLabel).is_none());
        assert!(resource.parts().is_empty());
        assert_eq!(resource.cardinality(), Some(Cardinality::exactly_one()));
    }

    #[test]
    fn test_language_string_selection() {
        let label = LanguageString::of("en", "Person").with("cs", "Osoba");
        assert_eq!(label.select(&["cs".into(), "en".into()]), Some("Osoba"));
        assert_eq!(label.select(&["de".into()]), Some("Osoba"));
        assert_eq!(LanguageString::new().select(&["en".into()]), None);
    }

    #[test]
    fn test_attribute_shape_check() {
        assert!(AttributeKey::HumanLabel.accepts(&LanguageString::of("en", "x").into()));
        assert!(!AttributeKey::HumanLabel.accepts(&AttributeValue::Text("x".into())));
        assert!(AttributeKey::Dematerialize.accepts(&true.into()));
        assert!(AttributeKey::Parts.is_structural_link());
    }

    #[test]
    fn test_resource_serializes_with_kebab_keys() {
        let resource = Resource::new("x", ResourceType::StructuralClass)
            .with(AttributeKey::IsCodelist, true);
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["types"][0], "structural-class");
        assert_eq!(json["attributes"]["is-codelist"]["value"], true);
        let back: Resource = serde_json::from_value(json).unwrap();
        assert_eq!(back, resource);
    }
}
