//! JSON Schema tree to JSON

use serde_json::{json, Map, Value};

use super::model::{JsonDefinition, JsonKind, JsonSchema};

pub fn write_json_schema(schema: &JsonSchema) -> Value {
    let mut object = Map::new();
    if let Some(dialect) = &schema.schema {
        object.insert("$schema".into(), Value::String(dialect.clone()));
    }
    if let Some(id) = &schema.id {
        object.insert("$id".into(), Value::String(id.clone()));
    }
    write_definition(&mut object, &schema.root);
    if !schema.defs.is_empty() {
        let defs = schema
            .defs
            .iter()
            .map(|(name, definition)| (name.clone(), definition_value(definition)))
            .collect();
        object.insert("$defs".into(), Value::Object(defs));
    }
    Value::Object(object)
}

fn definition_value(definition: &JsonDefinition) -> Value {
    let mut object = Map::new();
    write_definition(&mut object, definition);
    Value::Object(object)
}

fn write_definition(object: &mut Map<String, Value>, definition: &JsonDefinition) {
    if let Some(title) = &definition.title {
        object.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(description) = &definition.description {
        object.insert("description".into(), Value::String(description.clone()));
    }

    match &definition.kind {
        JsonKind::Object { properties, required } => {
            object.insert("type".into(), json!("object"));
            if !required.is_empty() {
                object.insert("required".into(), json!(required));
            }
            let properties = properties
                .iter()
                .map(|(name, property)| (name.clone(), definition_value(property)))
                .collect();
            object.insert("properties".into(), Value::Object(properties));
        }
        JsonKind::Array {
            items,
            min_items,
            max_items,
        } => {
            object.insert("type".into(), json!("array"));
            object.insert("items".into(), definition_value(items));
            if let Some(min) = min_items {
                object.insert("minItems".into(), json!(min));
            }
            if let Some(max) = max_items {
                object.insert("maxItems".into(), json!(max));
            }
        }
        JsonKind::String { format } => {
            object.insert("type".into(), json!("string"));
            if let Some(format) = format {
                object.insert("format".into(), json!(format));
            }
        }
        JsonKind::Integer => {
            object.insert("type".into(), json!("integer"));
        }
        JsonKind::Number => {
            object.insert("type".into(), json!("number"));
        }
        JsonKind::Boolean => {
            object.insert("type".into(), json!("boolean"));
        }
        JsonKind::LanguageMap => {
            object.insert("type".into(), json!("object"));
            object.insert("additionalProperties".into(), json!({ "type": "string" }));
        }
        JsonKind::AnyOf(alternatives) => {
            object.insert(
                "anyOf".into(),
                Value::Array(alternatives.iter().map(definition_value).collect()),
            );
        }
        JsonKind::Ref(target) => {
            object.insert("$ref".into(), Value::String(target.clone()));
        }
        JsonKind::Any => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_array_bounds() {
        let schema = JsonSchema {
            schema: None,
            id: None,
            root: JsonDefinition::new(JsonKind::Array {
                items: Box::new(JsonDefinition::string(None)),
                min_items: Some(1),
                max_items: None,
            }),
            defs: BTreeMap::new(),
        };
        assert_eq!(
            write_json_schema(&schema),
            json!({ "type": "array", "items": { "type": "string" }, "minItems": 1 })
        );
    }
}
