//! Structural model to XML Schema tree

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::model::{
    QName, XmlAnnotation, XmlComplexItem, XmlComplexType, XmlContent, XmlContentBody, XmlElement, XmlGroup,
    XmlImport, XmlSchema, XmlType,
};
use crate::config::XmlSchemaConfig;
use crate::datatype::KnownDatatype;
use crate::error::{ModelError, ModelResult};
use crate::generator::GeneratorContext;
use crate::resource::Iri;
use crate::specification::{generators, path_relative, ArtefactDescriptor};
use crate::structural::{PropertyRange, StructuralClass, StructuralModel, StructuralProperty};

const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";
const IRI_ELEMENT: &str = "iri";
const LANG_STRING: &str = "langString";

pub struct XmlSchemaAdapter<'a> {
    context: &'a GeneratorContext,
    model: &'a StructuralModel,
    artefact: &'a ArtefactDescriptor,
    options: &'a XmlSchemaConfig,
    /// Structural models of foreign classes, keyed by schema IRI
    imported_models: &'a BTreeMap<Iri, Arc<StructuralModel>>,
    imports: BTreeMap<Iri, XmlImport>,
    groups: BTreeMap<String, XmlGroup>,
    types: BTreeMap<String, XmlComplexType>,
    /// Class ranges currently being expanded, outermost first
    expanding: Vec<String>,
    /// Class ranges reached again while being expanded
    recursive: BTreeSet<String>,
    uses_lang_string: bool,
}

impl<'a> XmlSchemaAdapter<'a> {
    pub fn new(
        context: &'a GeneratorContext,
        model: &'a StructuralModel,
        artefact: &'a ArtefactDescriptor,
        options: &'a XmlSchemaConfig,
        imported_models: &'a BTreeMap<Iri, Arc<StructuralModel>>,
    ) -> Self {
        Self {
            context,
            model,
            artefact,
            options,
            imported_models,
            imports: BTreeMap::new(),
            groups: BTreeMap::new(),
            types: BTreeMap::new(),
            expanding: Vec::new(),
            recursive: BTreeSet::new(),
            uses_lang_string: false,
        }
    }

    pub fn adapt(mut self) -> ModelResult<XmlSchema> {
        let mut elements = Vec::new();
        for root in self.model.root_classes()? {
            let element = self.class_to_element(root)?;
            let element = self.extract_group_from_root(element);
            elements.push(self.extract_type_from_root(element));
        }
        Ok(XmlSchema {
            target_namespace: self.model.namespace.clone(),
            target_prefix: self.model.namespace_prefix.clone(),
            imports: self.imports.into_values().collect(),
            define_lang_string: self.uses_lang_string,
            groups: self.groups.into_values().collect(),
            types: self.types.into_values().collect(),
            elements,
        })
    }

    fn local_name(&self, local: &str) -> QName {
        QName::new(self.model.namespace_prefix.as_deref(), local)
    }

    // =========================================================================
    // Roots
    // =========================================================================

    fn class_to_element(&mut self, class: &'a StructuralClass) -> ModelResult<XmlElement> {
        let key = range_key(&[class]);
        self.expanding.push(key.clone());
        let definition = self.class_to_complex_item(class, false, false, false);
        self.expanding.pop();
        let definition = definition?;
        if self.recursive.contains(&key) {
            let name = class.name().to_string();
            self.types.insert(
                name.clone(),
                XmlComplexType {
                    name: Some(name),
                    is_abstract: false,
                    annotation: None,
                    definition: definition.clone(),
                },
            );
        }
        Ok(XmlElement {
            name: self.resolve_element_name(class),
            element_type: Some(XmlType::Complex(XmlComplexType {
                name: None,
                is_abstract: false,
                annotation: annotation(class.cim_iri.as_deref(), &class.human_label, &class.human_description),
                definition,
            })),
            annotation: None,
        })
    }

    fn extract_group_from_root(&mut self, element: XmlElement) -> XmlElement {
        if !self.options.root_class.extract_group {
            return element;
        }
        match element.element_type {
            Some(XmlType::Complex(complex)) => {
                let name = element.name.local.clone();
                self.groups.insert(
                    name.clone(),
                    XmlGroup {
                        name: name.clone(),
                        contents: vec![XmlContent::once(complex.definition)],
                    },
                );
                XmlElement {
                    element_type: Some(XmlType::Complex(XmlComplexType {
                        name: complex.name,
                        is_abstract: complex.is_abstract,
                        annotation: complex.annotation,
                        definition: XmlComplexItem::Group(self.local_name(&name)),
                    })),
                    ..element
                }
            }
            other => XmlElement {
                element_type: other,
                ..element
            },
        }
    }

    fn extract_type_from_root(&mut self, element: XmlElement) -> XmlElement {
        if !self.options.root_class.extract_type {
            return element;
        }
        match element.element_type {
            Some(XmlType::Complex(mut complex)) => {
                let name = element.name.local.clone();
                complex.name = Some(name.clone());
                self.types.insert(name.clone(), complex);
                XmlElement {
                    element_type: Some(XmlType::Named(self.local_name(&name))),
                    ..element
                }
            }
            other => XmlElement {
                element_type: other,
                ..element
            },
        }
    }

    // =========================================================================
    // Imports
    // =========================================================================

    /// Name of the element or group for `class`, importing its schema when
    /// the class belongs to another specification
    fn resolve_element_name(&mut self, class: &StructuralClass) -> QName {
        if !self.model.is_foreign(class) {
            return QName::new(None, class.name());
        }
        if let Some(specification) = &class.specification {
            if let Some(import) = self.imports.get(specification) {
                return QName::new(import.prefix.as_deref(), class.name());
            }
        }
        let Some(foreign) = self.context.foreign_artefact(class, generators::XML_SCHEMA) else {
            return QName::new(None, class.name());
        };
        let imported = self.imported_models.get(&class.structure_schema);
        let import = XmlImport {
            namespace: imported.and_then(|model| model.namespace.clone()),
            prefix: imported.and_then(|model| model.namespace_prefix.clone()),
            schema_location: path_relative(&self.artefact.public_url, &foreign.public_url),
        };
        let name = QName::new(import.prefix.as_deref(), class.name());
        if let Some(specification) = &class.specification {
            self.imports.insert(specification.clone(), import);
        }
        name
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn class_to_complex_item(
        &mut self,
        class: &'a StructuralClass,
        extract_group: bool,
        skip_iri: bool,
        own_only: bool,
    ) -> ModelResult<XmlComplexItem> {
        if self.model.is_foreign(class) {
            return Ok(XmlComplexItem::Group(self.resolve_element_name(class)));
        }

        let mut contents = Vec::new();
        if !skip_iri {
            contents.push(iri_content());
        }
        let properties: Vec<&'a StructuralProperty> = if own_only {
            class.own_properties(self.model).collect()
        } else {
            class.properties.iter().collect()
        };
        for property in properties {
            contents.push(self.property_to_content(property)?);
        }

        if extract_group && self.options.other_classes.extract_group {
            let name = class.name().to_string();
            self.groups.insert(name.clone(), XmlGroup { name: name.clone(), contents });
            return Ok(XmlComplexItem::Group(self.local_name(&name)));
        }
        Ok(XmlComplexItem::Sequence(contents))
    }

    fn property_to_content(&mut self, property: &'a StructuralProperty) -> ModelResult<XmlContent> {
        let cardinality = property.effective_cardinality();
        Ok(XmlContent {
            min: cardinality.min,
            max: cardinality.max,
            body: XmlContentBody::Element(self.property_to_element(property)?),
        })
    }

    fn property_to_element(&mut self, property: &'a StructuralProperty) -> ModelResult<XmlElement> {
        let element_type = match property.range()? {
            PropertyRange::Datatypes(datatypes) => self.datatype_property_to_type(&datatypes),
            PropertyRange::Classes(iris) => {
                let mut classes = Vec::with_capacity(iris.len());
                for iri in iris {
                    classes.push(self.model.require_class(iri)?);
                }
                // Codelists are referenced by IRI
                match classes.iter().filter(|class| class.is_codelist).count() {
                    0 => self.class_property_to_type(&classes)?,
                    count if count == classes.len() => XmlType::Named(QName::xs("anyURI")),
                    _ => return Err(ModelError::AmbiguousPropertyRange(property.iri.clone())),
                }
            }
        };
        Ok(XmlElement {
            name: QName::new(None, property.name()),
            element_type: Some(element_type),
            annotation: annotation(
                property.cim_iri.as_deref(),
                &property.human_label,
                &property.human_description,
            ),
        })
    }

    /// A range reached again while it is being expanded refers to the named
    /// type the outer expansion defines
    fn class_property_to_type(&mut self, classes: &[&'a StructuralClass]) -> ModelResult<XmlType> {
        let key = range_key(classes);
        if self.expanding.contains(&key) {
            self.recursive.insert(key);
            return Ok(XmlType::Named(self.local_name(&range_type_name(classes))));
        }

        self.expanding.push(key.clone());
        let definition = self.class_property_to_complex_definition(classes);
        self.expanding.pop();
        let (definition, name, is_abstract) = definition?;
        let name = name.or_else(|| self.recursive.contains(&key).then(|| range_type_name(classes)));
        match name {
            Some(name) => {
                self.types.insert(
                    name.clone(),
                    XmlComplexType {
                        name: Some(name.clone()),
                        is_abstract,
                        annotation: None,
                        definition,
                    },
                );
                Ok(XmlType::Named(self.local_name(&name)))
            }
            None => Ok(XmlType::Complex(XmlComplexType {
                name: None,
                is_abstract,
                annotation: None,
                definition,
            })),
        }
    }

    /// A single class is inlined. Several classes become a type hierarchy:
    /// one root type, every other class an extension of its parent.
    fn class_property_to_complex_definition(
        &mut self,
        classes: &[&'a StructuralClass],
    ) -> ModelResult<(XmlComplexItem, Option<String>, bool)> {
        if let [class] = classes {
            let name = self
                .options
                .other_classes
                .extract_type
                .then(|| class.name().to_string());
            let item = self.class_to_complex_item(*class, true, false, false)?;
            return Ok((item, name, false));
        }

        let members: BTreeSet<&str> = classes.iter().map(|class| class.iri.as_str()).collect();
        let mut roots = Vec::new();
        for class in classes {
            match class.inherits_from.as_slice() {
                [] => roots.push(*class),
                [parent] if !members.contains(parent.as_str()) => {
                    return Err(ModelError::UnsupportedModel(format!(
                        "class {} extends a class outside the property range",
                        class.name()
                    )))
                }
                [_] => {}
                _ => {
                    return Err(ModelError::UnsupportedModel(format!(
                        "multiple inheritance is not supported (class {})",
                        class.name()
                    )))
                }
            }
        }

        let (root_class, root, root_name) = self.pick_choice_root(&roots)?;
        for &class in classes {
            if root_class.map_or(false, |root| root.iri == class.iri) {
                continue;
            }
            let definition = self.class_to_complex_item(class, false, true, true)?;
            let base = match class.inherits_from.first() {
                Some(parent) => self.model.require_class(parent)?.name().to_string(),
                None => root_name.clone(),
            };
            let name = class.name().to_string();
            self.types.insert(
                name.clone(),
                XmlComplexType {
                    name: Some(name),
                    is_abstract: false,
                    annotation: None,
                    definition: XmlComplexItem::Extension {
                        base: self.local_name(&base),
                        contents: vec![XmlContent::once(definition)],
                    },
                },
            );
        }
        Ok((root, Some(root_name), root_class.is_none()))
    }

    /// The only root, or an abstract type holding just the IRI
    fn pick_choice_root(
        &mut self,
        roots: &[&'a StructuralClass],
    ) -> ModelResult<(Option<&'a StructuralClass>, XmlComplexItem, String)> {
        if let [root] = roots {
            let item = self.class_to_complex_item(*root, true, false, false)?;
            return Ok((Some(*root), item, root.name().to_string()));
        }
        let name = roots
            .iter()
            .map(|class| format!("_{}", class.name()))
            .collect::<String>();
        Ok((None, XmlComplexItem::Sequence(vec![iri_content()]), name))
    }

    // =========================================================================
    // Datatypes
    // =========================================================================

    fn datatype_property_to_type(&mut self, datatypes: &[Option<&str>]) -> XmlType {
        let mut names: Vec<QName> = datatypes.iter().map(|datatype| self.primitive(*datatype)).collect();
        if names.len() == 1 {
            return XmlType::Named(names.remove(0));
        }
        XmlType::Union(names)
    }

    fn primitive(&mut self, datatype: Option<&str>) -> QName {
        let Some(iri) = datatype else {
            return QName::xs("anySimpleType");
        };
        if let Some(local) = iri.strip_prefix(XSD_NAMESPACE) {
            return QName::xs(local);
        }
        let local = match KnownDatatype::from_iri(iri) {
            Some(KnownDatatype::Boolean) => "boolean",
            Some(KnownDatatype::Date) => "date",
            Some(KnownDatatype::Time) => "time",
            Some(KnownDatatype::DateTime) => "dateTime",
            Some(KnownDatatype::Integer) => "integer",
            Some(KnownDatatype::Decimal) => "decimal",
            Some(KnownDatatype::Url) => "anyURI",
            Some(KnownDatatype::String) => "string",
            Some(KnownDatatype::Text) => {
                self.uses_lang_string = true;
                return self.local_name(LANG_STRING);
            }
            None => "anySimpleType",
        };
        QName::xs(local)
    }
}

fn range_key(classes: &[&StructuralClass]) -> String {
    classes.iter().map(|class| class.iri.as_str()).collect::<Vec<_>>().join(" ")
}

/// Name of the type a class range defines: the class itself, the single
/// root of a hierarchy, or the abstract root of several
fn range_type_name(classes: &[&StructuralClass]) -> String {
    if let [class] = classes {
        return class.name().to_string();
    }
    let roots: Vec<&&StructuralClass> = classes.iter().filter(|class| class.inherits_from.is_empty()).collect();
    match roots.as_slice() {
        [root] => root.name().to_string(),
        _ => roots.iter().map(|class| format!("_{}", class.name())).collect(),
    }
}

fn iri_content() -> XmlContent {
    XmlContent {
        min: 0,
        max: Some(1),
        body: XmlContentBody::Element(XmlElement {
            name: QName::new(None, IRI_ELEMENT),
            element_type: Some(XmlType::Named(QName::xs("anyURI"))),
            annotation: None,
        }),
    }
}

fn annotation(
    cim_iri: Option<&str>,
    label: &crate::resource::LanguageString,
    description: &crate::resource::LanguageString,
) -> Option<XmlAnnotation> {
    let mut lines = Vec::new();
    if let Some(cim) = cim_iri {
        lines.push(format!("Význam: {}", cim));
    }
    lines.extend(label.iter().map(|(language, text)| format!("Název ({}): {}", language, text)));
    lines.extend(
        description
            .iter()
            .map(|(language, text)| format!("Popis ({}): {}", language, text)),
    );
    if lines.is_empty() {
        return None;
    }
    Some(XmlAnnotation {
        model_reference: cim_iri.map(str::to_string),
        documentation: lines.join("\n"),
    })
}
