//! XML Schema tree to text

use super::model::{
    QName, XmlAnnotation, XmlComplexItem, XmlComplexType, XmlContent, XmlContentBody, XmlElement, XmlSchema,
    XmlType,
};

const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
const SAWSDL_NAMESPACE: &str = "http://www.w3.org/ns/sawsdl";

// =============================================================================
// Public API
// =============================================================================

pub fn write_xml_schema(schema: &XmlSchema) -> String {
    let mut output = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");

    output.push_str(&format!(
        "<xs:schema xmlns:xs=\"{}\" version=\"1.1\" elementFormDefault=\"unqualified\" xmlns:sawsdl=\"{}\"",
        XS_NAMESPACE, SAWSDL_NAMESPACE
    ));
    if let Some(namespace) = &schema.target_namespace {
        output.push_str(&format!(" targetNamespace=\"{}\"", escape(namespace)));
        if let Some(prefix) = &schema.target_prefix {
            output.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(namespace)));
        }
    }
    for import in &schema.imports {
        if let (Some(prefix), Some(namespace)) = (&import.prefix, &import.namespace) {
            output.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(namespace)));
        }
    }
    output.push_str(">\n");

    if schema.define_lang_string {
        output.push_str(&format!(
            "  <xs:import namespace=\"{}\" schemaLocation=\"http://www.w3.org/2001/xml.xsd\"/>\n",
            XML_NAMESPACE
        ));
    }
    for import in &schema.imports {
        output.push_str("  <xs:import");
        if let Some(namespace) = &import.namespace {
            output.push_str(&format!(" namespace=\"{}\"", escape(namespace)));
        }
        output.push_str(&format!(" schemaLocation=\"{}\"/>\n", escape(&import.schema_location)));
    }
    if schema.define_lang_string {
        emit_lang_string(&mut output);
    }

    for group in &schema.groups {
        output.push_str(&format!("  <xs:group name=\"{}\">\n", escape(&group.name)));
        emit_sequence(&mut output, &group.contents, 2, None);
        output.push_str("  </xs:group>\n");
    }
    for complex in &schema.types {
        emit_complex_type(&mut output, complex, 1);
    }
    for element in &schema.elements {
        emit_element(&mut output, element, 1, None);
    }

    output.push_str("</xs:schema>\n");
    output
}

// =============================================================================
// Emission
// =============================================================================

fn indent(level: usize) -> String {
    "  ".repeat(level)
}

fn occurs(min: u32, max: Option<u32>) -> String {
    let mut attributes = String::new();
    if min != 1 {
        attributes.push_str(&format!(" minOccurs=\"{}\"", min));
    }
    match max {
        Some(1) => {}
        Some(max) => attributes.push_str(&format!(" maxOccurs=\"{}\"", max)),
        None => attributes.push_str(" maxOccurs=\"unbounded\""),
    }
    attributes
}

fn emit_lang_string(output: &mut String) {
    output.push_str("  <xs:complexType name=\"langString\">\n");
    output.push_str("    <xs:simpleContent>\n");
    output.push_str("      <xs:extension base=\"xs:string\">\n");
    output.push_str("        <xs:attribute ref=\"xml:lang\" use=\"required\"/>\n");
    output.push_str("      </xs:extension>\n");
    output.push_str("    </xs:simpleContent>\n");
    output.push_str("  </xs:complexType>\n");
}

fn emit_annotation(output: &mut String, annotation: &Option<XmlAnnotation>, level: usize) {
    let Some(annotation) = annotation else {
        return;
    };
    output.push_str(&format!("{}<xs:annotation", indent(level)));
    if let Some(reference) = &annotation.model_reference {
        output.push_str(&format!(" sawsdl:modelReference=\"{}\"", escape(reference)));
    }
    output.push_str(">\n");
    output.push_str(&format!(
        "{}<xs:documentation>{}</xs:documentation>\n",
        indent(level + 1),
        escape(&annotation.documentation)
    ));
    output.push_str(&format!("{}</xs:annotation>\n", indent(level)));
}

/// `bounds` is the occurrence of the element inside its parent sequence
fn emit_element(output: &mut String, element: &XmlElement, level: usize, bounds: Option<(u32, Option<u32>)>) {
    let pad = indent(level);
    let occurrence = bounds.map(|(min, max)| occurs(min, max)).unwrap_or_default();

    // Prefixed names point at declarations in an imported schema
    if element.name.prefix.is_some() {
        output.push_str(&format!("{}<xs:element ref=\"{}\"{}/>\n", pad, element.name, occurrence));
        return;
    }

    output.push_str(&format!("{}<xs:element name=\"{}\"{}", pad, escape(&element.name.local), occurrence));
    match &element.element_type {
        Some(XmlType::Named(name)) if element.annotation.is_none() => {
            output.push_str(&format!(" type=\"{}\"/>\n", name));
        }
        Some(XmlType::Named(name)) => {
            output.push_str(&format!(" type=\"{}\">\n", name));
            emit_annotation(output, &element.annotation, level + 1);
            output.push_str(&format!("{}</xs:element>\n", pad));
        }
        Some(XmlType::Complex(complex)) => {
            output.push_str(">\n");
            emit_annotation(output, &element.annotation, level + 1);
            emit_complex_type(output, complex, level + 1);
            output.push_str(&format!("{}</xs:element>\n", pad));
        }
        Some(XmlType::Union(members)) => {
            output.push_str(">\n");
            emit_annotation(output, &element.annotation, level + 1);
            let members: Vec<String> = members.iter().map(QName::to_string).collect();
            output.push_str(&format!("{}<xs:simpleType>\n", indent(level + 1)));
            output.push_str(&format!(
                "{}<xs:union memberTypes=\"{}\"/>\n",
                indent(level + 2),
                members.join(" ")
            ));
            output.push_str(&format!("{}</xs:simpleType>\n", indent(level + 1)));
            output.push_str(&format!("{}</xs:element>\n", pad));
        }
        None if element.annotation.is_none() => output.push_str("/>\n"),
        None => {
            output.push_str(">\n");
            emit_annotation(output, &element.annotation, level + 1);
            output.push_str(&format!("{}</xs:element>\n", pad));
        }
    }
}

fn emit_complex_type(output: &mut String, complex: &XmlComplexType, level: usize) {
    let pad = indent(level);
    output.push_str(&format!("{}<xs:complexType", pad));
    if let Some(name) = &complex.name {
        output.push_str(&format!(" name=\"{}\"", escape(name)));
    }
    if complex.is_abstract {
        output.push_str(" abstract=\"true\"");
    }
    output.push_str(">\n");
    emit_annotation(output, &complex.annotation, level + 1);
    emit_item(output, &complex.definition, level + 1, None);
    output.push_str(&format!("{}</xs:complexType>\n", pad));
}

fn emit_item(output: &mut String, item: &XmlComplexItem, level: usize, bounds: Option<(u32, Option<u32>)>) {
    let pad = indent(level);
    let occurrence = bounds.map(|(min, max)| occurs(min, max)).unwrap_or_default();
    match item {
        XmlComplexItem::Sequence(contents) => emit_sequence(output, contents, level, bounds),
        XmlComplexItem::Group(name) => {
            output.push_str(&format!("{}<xs:group ref=\"{}\"{}/>\n", pad, name, occurrence));
        }
        XmlComplexItem::Extension { base, contents } => {
            output.push_str(&format!("{}<xs:complexContent>\n", pad));
            output.push_str(&format!("{}<xs:extension base=\"{}\">\n", indent(level + 1), base));
            for content in contents {
                emit_content(output, content, level + 2);
            }
            output.push_str(&format!("{}</xs:extension>\n", indent(level + 1)));
            output.push_str(&format!("{}</xs:complexContent>\n", pad));
        }
    }
}

fn emit_sequence(output: &mut String, contents: &[XmlContent], level: usize, bounds: Option<(u32, Option<u32>)>) {
    let pad = indent(level);
    let occurrence = bounds.map(|(min, max)| occurs(min, max)).unwrap_or_default();
    if contents.is_empty() {
        output.push_str(&format!("{}<xs:sequence{}/>\n", pad, occurrence));
        return;
    }
    output.push_str(&format!("{}<xs:sequence{}>\n", pad, occurrence));
    for content in contents {
        emit_content(output, content, level + 1);
    }
    output.push_str(&format!("{}</xs:sequence>\n", pad));
}

fn emit_content(output: &mut String, content: &XmlContent, level: usize) {
    let bounds = Some((content.min, content.max));
    match &content.body {
        XmlContentBody::Element(element) => emit_element(output, element, level, bounds),
        XmlContentBody::Item(item) => emit_item(output, item, level, bounds),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurrence_attributes() {
        assert_eq!(occurs(1, Some(1)), "");
        assert_eq!(occurs(0, None), " minOccurs=\"0\" maxOccurs=\"unbounded\"");
        assert_eq!(occurs(2, Some(5)), " minOccurs=\"2\" maxOccurs=\"5\"");
    }

    #[test]
    fn test_escapes_documentation() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }
}
