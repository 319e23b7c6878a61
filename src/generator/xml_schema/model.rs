//! XML Schema tree produced by the adapter

/// Optional prefix and local name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(prefix: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local: local.into(),
        }
    }

    pub fn xs(local: &str) -> Self {
        Self::new(Some("xs"), local)
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlSchema {
    pub target_namespace: Option<String>,
    pub target_prefix: Option<String>,
    pub imports: Vec<XmlImport>,
    pub define_lang_string: bool,
    pub groups: Vec<XmlGroup>,
    /// Named top-level complex types
    pub types: Vec<XmlComplexType>,
    pub elements: Vec<XmlElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlImport {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub schema_location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// A prefixed name refers to an element declared elsewhere
    pub name: QName,
    pub element_type: Option<XmlType>,
    pub annotation: Option<XmlAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlType {
    Named(QName),
    Complex(XmlComplexType),
    Union(Vec<QName>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlComplexType {
    pub name: Option<String>,
    pub is_abstract: bool,
    pub annotation: Option<XmlAnnotation>,
    pub definition: XmlComplexItem,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlComplexItem {
    Sequence(Vec<XmlContent>),
    /// Reference to a named group
    Group(QName),
    Extension { base: QName, contents: Vec<XmlContent> },
}

/// One particle of a sequence with its occurrence bounds
#[derive(Debug, Clone, PartialEq)]
pub struct XmlContent {
    pub min: u32,
    /// `None` is unbounded
    pub max: Option<u32>,
    pub body: XmlContentBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlContentBody {
    Element(XmlElement),
    Item(XmlComplexItem),
}

impl XmlContent {
    pub fn once(item: XmlComplexItem) -> Self {
        Self {
            min: 1,
            max: Some(1),
            body: XmlContentBody::Item(item),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlGroup {
    pub name: String,
    pub contents: Vec<XmlContent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlAnnotation {
    pub model_reference: Option<String>,
    pub documentation: String,
}
