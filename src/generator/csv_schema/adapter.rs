//! Structural model to CSVW metadata

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{json, Value};

use super::model::{
    Column, CsvSchema, ForeignKey, MultipleTableSchema, Reference, SingleTableSchema, Table, TableSchema,
    CSVW_CONTEXT,
};
use crate::config::{GenerationConfig, TableLayout};
use crate::datatype::KnownDatatype;
use crate::error::{ModelError, ModelResult};
use crate::resource::{Iri, LanguageString};
use crate::specification::ArtefactDescriptor;
use crate::structural::{PropertyRange, StructuralClass, StructuralModel, StructuralProperty};

const ID_COLUMN: &str = "ReferenceId";

pub struct CsvSchemaAdapter<'a> {
    model: &'a StructuralModel,
    artefact: &'a ArtefactDescriptor,
    layout: TableLayout,
    language: Option<&'a str>,
}

/// What a property contributes to a table
enum ColumnSource<'a> {
    Primitive(Option<String>),
    Class(&'a StructuralClass),
}

impl<'a> CsvSchemaAdapter<'a> {
    pub fn new(model: &'a StructuralModel, artefact: &'a ArtefactDescriptor, config: &'a GenerationConfig) -> Self {
        Self {
            model,
            artefact,
            layout: config.csv_schema.layout,
            language: config.documentation.languages.first().map(String::as_str),
        }
    }

    pub fn adapt(&self) -> ModelResult<CsvSchema> {
        let [root] = self.model.roots.as_slice() else {
            return Err(ModelError::UnsupportedModel(format!(
                "CSV schema of {} needs exactly one root class, found {}",
                self.model.iri,
                self.model.roots.len()
            )));
        };
        let root = self.model.require_class(root)?;
        let context = json!([CSVW_CONTEXT, { "@language": self.language.unwrap_or("cs") }]);

        match self.layout {
            TableLayout::Single => {
                let mut table_schema = TableSchema::default();
                let mut stack = vec![root.iri.clone()];
                self.fill_single_table(&mut table_schema, root, "", &mut stack)?;
                table_schema.columns.push(type_column(root));
                Ok(CsvSchema::Single(SingleTableSchema {
                    context,
                    table: Table {
                        id: Some(self.artefact.public_url.clone()).filter(|url| !url.is_empty()),
                        url: self.table_url("table.csv"),
                        table_schema,
                    },
                }))
            }
            TableLayout::Multiple => {
                let mut tables = Vec::new();
                let mut stack = Vec::new();
                self.make_tables(&mut tables, root, None, &mut stack)?;
                Ok(CsvSchema::Multiple(MultipleTableSchema { context, tables }))
            }
        }
    }

    /// `name` next to the published metadata document
    fn table_url(&self, name: &str) -> String {
        match self.artefact.public_url.rsplit_once('/') {
            Some((directory, _)) => format!("{}/{}", directory, name),
            None => name.to_string(),
        }
    }

    fn source(&self, property: &'a StructuralProperty) -> ModelResult<ColumnSource<'a>> {
        match property.range()? {
            PropertyRange::Datatypes(datatypes) => Ok(ColumnSource::Primitive(match datatypes.as_slice() {
                [datatype] => primitive(*datatype),
                _ => Some("string".to_string()),
            })),
            PropertyRange::Classes(classes) => match classes.as_slice() {
                [class] => Ok(ColumnSource::Class(self.model.require_class(class)?)),
                _ => Err(ModelError::UnsupportedModel(format!(
                    "property {} has more than one class in its range",
                    property.iri
                ))),
            },
        }
    }

    // =========================================================================
    // Single table
    // =========================================================================

    /// Nested classes are flattened into columns prefixed with the path of
    /// association labels. A class already on the path ends the recursion.
    fn fill_single_table(
        &self,
        table_schema: &mut TableSchema,
        class: &'a StructuralClass,
        prefix: &str,
        stack: &mut Vec<Iri>,
    ) -> ModelResult<()> {
        for property in &class.properties {
            match self.source(property)? {
                ColumnSource::Primitive(datatype) => {
                    table_schema.columns.push(self.simple_column(property, prefix, datatype, false));
                }
                ColumnSource::Class(target) => {
                    if target.properties.is_empty() || target.is_codelist || stack.contains(&target.iri) {
                        table_schema.columns.push(self.simple_column(
                            property,
                            prefix,
                            Some("string".into()),
                            target.is_codelist,
                        ));
                    } else {
                        stack.push(target.iri.clone());
                        let nested = format!("{}{}_", prefix, property.name());
                        self.fill_single_table(table_schema, target, &nested, stack)?;
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Multiple tables
    // =========================================================================

    /// One table per class; a nested table's key column refers back to the
    /// association column of its parent table.
    fn make_tables(
        &self,
        tables: &mut Vec<Table>,
        class: &'a StructuralClass,
        reference: Option<Reference>,
        stack: &mut Vec<Iri>,
    ) -> ModelResult<()> {
        let url = self.table_url(&format!("tables/{}.csv", tables.len() + 1));
        let index = tables.len();
        tables.push(Table {
            id: None,
            url: url.clone(),
            table_schema: TableSchema::default(),
        });
        stack.push(class.iri.clone());

        let mut table_schema = TableSchema::default();
        if let Some(reference) = reference {
            table_schema.foreign_keys.push(ForeignKey {
                column_reference: ID_COLUMN.to_string(),
                reference,
            });
        }
        table_schema.columns.push(Column {
            name: Some(ID_COLUMN.to_string()),
            datatype: Some("string".to_string()),
            ..Default::default()
        });

        for property in &class.properties {
            match self.source(property)? {
                ColumnSource::Primitive(datatype) => {
                    table_schema.columns.push(self.simple_column(property, "", datatype, false));
                }
                ColumnSource::Class(target) => {
                    table_schema.columns.push(self.simple_column(
                        property,
                        "",
                        Some("string".into()),
                        target.is_codelist,
                    ));
                    if !target.properties.is_empty() && !target.is_codelist && !stack.contains(&target.iri) {
                        let reference = Reference {
                            resource: url.clone(),
                            column_reference: encode_uri(property.name()),
                        };
                        self.make_tables(tables, target, Some(reference), stack)?;
                    }
                }
            }
        }
        table_schema.columns.push(type_column(class));

        stack.pop();
        tables[index].table_schema = table_schema;
        Ok(())
    }

    fn simple_column(
        &self,
        property: &StructuralProperty,
        prefix: &str,
        datatype: Option<String>,
        is_codelist: bool,
    ) -> Column {
        let title = format!("{}{}", prefix, property.name());
        let name = encode_uri(&title);
        let cardinality = property.effective_cardinality();
        Column {
            value_url: is_codelist.then(|| format!("{{+{}}}", name)),
            datatype: if is_codelist { None } else { datatype },
            name: Some(name),
            titles: Some(title),
            dc_title: language_values(&property.human_label),
            dc_description: language_values(&property.human_description),
            property_url: property.cim_iri.clone(),
            lang: self.language.map(str::to_string),
            required: cardinality.min == 1 && cardinality.max == Some(1),
            is_virtual: false,
        }
    }
}

fn type_column(class: &StructuralClass) -> Column {
    Column {
        property_url: Some("rdf:type".to_string()),
        value_url: class.cim_iri.clone(),
        is_virtual: true,
        ..Default::default()
    }
}

/// One language as an object, several as an array, none omitted
fn language_values(text: &LanguageString) -> Option<Value> {
    let mut values: Vec<Value> = text
        .iter()
        .map(|(language, value)| json!({ "@value": value, "@language": language }))
        .collect();
    match values.len() {
        0 => None,
        1 => values.pop(),
        _ => Some(Value::Array(values)),
    }
}

/// CSVW datatype names
fn primitive(datatype: Option<&str>) -> Option<String> {
    let name = match KnownDatatype::from_iri(datatype?)? {
        KnownDatatype::Boolean => "boolean",
        KnownDatatype::Date => "date",
        KnownDatatype::Time => "time",
        KnownDatatype::DateTime => "dateTime",
        KnownDatatype::Integer => "integer",
        KnownDatatype::Decimal => "decimal",
        KnownDatatype::Url => "anyURI",
        KnownDatatype::String | KnownDatatype::Text => "string",
    };
    Some(name.to_string())
}

/// Characters `encodeURI` leaves alone besides ASCII letters and digits
const URI_KEEP: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

fn encode_uri(text: &str) -> String {
    utf8_percent_encode(text, URI_KEEP).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uri() {
        assert_eq!(encode_uri("název_ulice"), "n%C3%A1zev_ulice");
        assert_eq!(encode_uri("a b"), "a%20b");
        assert_eq!(encode_uri("adresa/ulice?#x"), "adresa/ulice?#x");
        assert_eq!(encode_uri("50%"), "50%25");
    }

    #[test]
    fn test_language_values() {
        assert_eq!(language_values(&LanguageString::new()), None);
        assert_eq!(
            language_values(&LanguageString::of("cs", "Jméno")),
            Some(json!({ "@value": "Jméno", "@language": "cs" }))
        );
    }
}
