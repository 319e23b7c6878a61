//! End-to-end generation from an operation-built store

mod common;

use async_trait::async_trait;
use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Value};

use common::*;
use specforge::datatype::KnownDatatype;
use specforge::specification::{generators, index_specifications};
use specforge::{
    ArtefactDescriptor, ArtefactGenerator, AttributeKey, AttributeValue, CancellationToken, Cardinality, DataSpecification,
    DirectoryOutputSink, Generator, GeneratorContext, MemoryOutputSink, ModelError, ModelResult, Operation,
    OutputSink, ResourceType,
};

fn generator(model: &Tourism, specification: DataSpecification) -> Generator {
    Generator::new(model.store.clone(), index_specifications(vec![specification]))
}

async fn json_output(sink: &MemoryOutputSink, path: &str) -> Value {
    serde_json::from_str(&sink.get(path).await.expect("artefact written")).unwrap()
}

#[tokio::test]
async fn test_generates_every_artefact_dependencies_first() {
    let model = tourism().await;
    let generator = generator(&model, tourism_specification(&model));
    let sink = MemoryOutputSink::new();

    let order = generator
        .generate_specification(SPECIFICATION, &sink, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(order.len(), 4);
    assert_eq!(order.last().unwrap(), &format!("{}#{}", SPECIFICATION, generators::DOCUMENTATION));
    assert_eq!(
        sink.paths().await,
        [
            "tourism/index.md",
            "tourism/person/schema.csv-metadata.json",
            "tourism/person/schema.json",
            "tourism/person/schema.xsd",
        ]
    );
    assert_eq!(sink.manifest().await.len(), 4);
}

#[tokio::test]
async fn test_json_schema_required_string() {
    let model = tourism().await;
    let generator = generator(&model, tourism_specification(&model));
    let sink = MemoryOutputSink::new();
    let artefact = format!("{}#{}", model.psm, generators::JSON_SCHEMA);

    generator
        .generate_artefact(SPECIFICATION, &artefact, &sink, &CancellationToken::new())
        .await
        .unwrap();
    let schema = json_output(&sink, "tourism/person/schema.json").await;

    assert_eq!(schema["type"], "object");
    assert_eq!(schema["$id"], "https://example.com/tourism/person/schema.json");
    assert_eq!(schema["required"], json!(["name"]));
    assert_eq!(schema["properties"]["name"]["type"], "string");
    assert_eq!(schema["properties"]["age"]["type"], "integer");
    assert_eq!(schema["properties"]["address"]["required"], json!(["street"]));
    assert_eq!(schema["title"], "Osoba");

    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .expect("generated schema compiles");
    assert!(compiled.is_valid(&json!({ "name": "Alice", "age": 30, "address": { "street": "Main" } })));
    assert!(!compiled.is_valid(&json!({ "age": 30 })));
    assert!(!compiled.is_valid(&json!({ "name": "Alice", "address": {} })));
}

/// Closes the cycle person -> address -> person
async fn add_resident(model: &Tourism) {
    model
        .store
        .apply_operation(
            Operation::create(ResourceType::StructuralAssociationEnd, Some(&model.address))
                .with_attribute(AttributeKey::TechnicalLabel, text("resident"))
                .with_attribute(
                    AttributeKey::Range,
                    AttributeValue::IriList(vec![model.person.clone()]),
                ),
        )
        .await
        .unwrap();
}

/// A class labelled `label` with one string attribute and a `next`
/// association pointing back at itself
async fn add_linked_class(model: &Tourism, label: &str, attribute: &str) -> String {
    let store = &model.store;
    let class = apply(
        store,
        Operation::create(ResourceType::StructuralClass, Some(&model.psm))
            .with_attribute(AttributeKey::TechnicalLabel, text(label)),
        ResourceType::StructuralClass,
    )
    .await;
    apply(
        store,
        Operation::create(ResourceType::StructuralAttribute, Some(&class))
            .with_attribute(AttributeKey::TechnicalLabel, text(attribute))
            .with_attribute(AttributeKey::Datatype, iri(&KnownDatatype::String.iri())),
        ResourceType::StructuralAttribute,
    )
    .await;
    apply(
        store,
        Operation::create(ResourceType::StructuralAssociationEnd, Some(&class))
            .with_attribute(AttributeKey::TechnicalLabel, text("next"))
            .with_attribute(AttributeKey::Range, AttributeValue::IriList(vec![class.clone()]))
            .with_attribute(AttributeKey::Cardinality, Cardinality::new(0, Some(1))),
        ResourceType::StructuralAssociationEnd,
    )
    .await;
    class
}

#[tokio::test]
async fn test_json_schema_breaks_cycles_with_defs() {
    let model = tourism().await;
    add_resident(&model).await;

    let generator = generator(&model, tourism_specification(&model));
    let sink = MemoryOutputSink::new();
    let artefact = format!("{}#{}", model.psm, generators::JSON_SCHEMA);
    generator
        .generate_artefact(SPECIFICATION, &artefact, &sink, &CancellationToken::new())
        .await
        .unwrap();
    let schema = json_output(&sink, "tourism/person/schema.json").await;

    assert_eq!(schema["$ref"], "#/$defs/person");
    assert_eq!(schema["$defs"]["person"]["type"], "object");
    let resident = &schema["$defs"]["person"]["properties"]["address"]["properties"]["resident"];
    assert_eq!(resident["type"], "array");
    assert_eq!(resident["items"]["$ref"], "#/$defs/person");
}

#[tokio::test]
async fn test_json_schema_defs_of_same_label_stay_distinct() {
    let model = tourism().await;
    for (end, attribute) in [("home", "street"), ("work", "company")] {
        let class = add_linked_class(&model, "place", attribute).await;
        apply(
            &model.store,
            Operation::create(ResourceType::StructuralAssociationEnd, Some(&model.person))
                .with_attribute(AttributeKey::TechnicalLabel, text(end))
                .with_attribute(AttributeKey::Range, AttributeValue::IriList(vec![class]))
                .with_attribute(AttributeKey::Cardinality, Cardinality::new(0, Some(1))),
            ResourceType::StructuralAssociationEnd,
        )
        .await;
    }

    let generator = generator(&model, tourism_specification(&model));
    let sink = MemoryOutputSink::new();
    let artefact = format!("{}#{}", model.psm, generators::JSON_SCHEMA);
    generator
        .generate_artefact(SPECIFICATION, &artefact, &sink, &CancellationToken::new())
        .await
        .unwrap();
    let schema = json_output(&sink, "tourism/person/schema.json").await;

    let defs = schema["$defs"].as_object().unwrap();
    assert_eq!(defs.len(), 2);
    let home = schema["properties"]["home"]["$ref"].as_str().unwrap();
    let work = schema["properties"]["work"]["$ref"].as_str().unwrap();
    assert_ne!(home, work);

    let definition = |reference: &str| defs[reference.trim_start_matches("#/$defs/")].clone();
    assert!(definition(home)["properties"].get("street").is_some());
    assert!(definition(work)["properties"].get("company").is_some());
    assert_eq!(definition(home)["properties"]["next"]["$ref"], home);
    assert_eq!(definition(work)["properties"]["next"]["$ref"], work);
}

#[tokio::test]
async fn test_xml_schema_refers_back_to_recursive_class() {
    let model = tourism().await;
    add_resident(&model).await;

    let generator = generator(&model, tourism_specification(&model));
    let sink = MemoryOutputSink::new();
    let artefact = format!("{}#{}", model.psm, generators::XML_SCHEMA);
    generator
        .generate_artefact(SPECIFICATION, &artefact, &sink, &CancellationToken::new())
        .await
        .unwrap();

    let xsd = sink.get("tourism/person/schema.xsd").await.unwrap();
    assert!(xsd.contains("<xs:complexType name=\"person\">"));
    let resident = xsd
        .lines()
        .find(|line| line.contains("name=\"resident\""))
        .expect("resident element");
    assert!(resident.contains("type=\"per:person\""));
    assert!(xsd.contains("<xs:element name=\"person\""));
}

#[tokio::test]
async fn test_cyclic_model_generates_every_artefact() {
    let model = tourism().await;
    add_resident(&model).await;

    let generator = generator(&model, tourism_specification(&model));
    let sink = MemoryOutputSink::new();
    generator
        .generate_specification(SPECIFICATION, &sink, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(sink.paths().await.len(), 4);

    let csv = json_output(&sink, "tourism/person/schema.csv-metadata.json").await;
    let names: Vec<&str> = csv["tableSchema"]["columns"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|column| column["name"].as_str())
        .collect();
    assert_eq!(names, ["name", "age", "address_street", "address_resident"]);

    let markdown = sink.get("tourism/index.md").await.unwrap();
    assert!(markdown.contains("resident"));
}

#[tokio::test]
async fn test_xml_schema_elements() {
    let model = tourism().await;
    let generator = generator(&model, tourism_specification(&model));
    let sink = MemoryOutputSink::new();
    let artefact = format!("{}#{}", model.psm, generators::XML_SCHEMA);
    generator
        .generate_artefact(SPECIFICATION, &artefact, &sink, &CancellationToken::new())
        .await
        .unwrap();

    let xsd = sink.get("tourism/person/schema.xsd").await.unwrap();
    assert!(xsd.starts_with("<?xml"));
    assert!(xsd.contains("targetNamespace=\"https://example.com/person/\""));
    assert!(xsd.contains("<xs:element name=\"person\""));
    assert!(xsd.contains("<xs:element name=\"name\" type=\"xs:string\""));
    assert!(xsd.contains("<xs:element name=\"street\""));
    assert!(xsd.trim_end().ends_with("</xs:schema>"));
}

#[tokio::test]
async fn test_xml_schema_rejects_multiple_inheritance_in_range() {
    let model = tourism().await;
    let store = &model.store;
    let mut range = Vec::new();
    for label in ["place", "building", "castle"] {
        range.push(
            apply(
                store,
                Operation::create(ResourceType::StructuralClass, Some(&model.psm))
                    .with_attribute(AttributeKey::TechnicalLabel, text(label)),
                ResourceType::StructuralClass,
            )
            .await,
        );
    }
    store
        .apply_operation(Operation::set_extends(&range[2], vec![range[0].clone(), range[1].clone()]))
        .await
        .unwrap();
    store
        .apply_operation(
            Operation::create(ResourceType::StructuralAssociationEnd, Some(&model.person))
                .with_attribute(AttributeKey::TechnicalLabel, text("visited"))
                .with_attribute(AttributeKey::Range, AttributeValue::IriList(range)),
        )
        .await
        .unwrap();

    let generator = generator(&model, tourism_specification(&model));
    let sink = MemoryOutputSink::new();
    let artefact = format!("{}#{}", model.psm, generators::XML_SCHEMA);
    let result = generator
        .generate_artefact(SPECIFICATION, &artefact, &sink, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ModelError::UnsupportedModel(message)) if message.contains("multiple inheritance")));
    assert!(sink.paths().await.is_empty());
}

#[tokio::test]
async fn test_csv_layout_comes_from_configuration() {
    let model = tourism().await;
    let mut specification = tourism_specification(&model);
    let csv_iri = format!("{}#{}", model.psm, generators::CSV_SCHEMA);
    let sink = MemoryOutputSink::new();
    generator(&model, specification.clone())
        .generate_artefact(SPECIFICATION, &csv_iri, &sink, &CancellationToken::new())
        .await
        .unwrap();

    let single = json_output(&sink, "tourism/person/schema.csv-metadata.json").await;
    let names: Vec<&str> = single["tableSchema"]["columns"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|column| column["name"].as_str())
        .collect();
    assert_eq!(names, ["name", "age", "address_street"]);
    assert_eq!(single["url"], "https://example.com/tourism/person/table.csv");
    let last = single["tableSchema"]["columns"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["propertyUrl"], "rdf:type");
    assert_eq!(last["virtual"], true);

    for artefact in &mut specification.artefacts {
        if artefact.iri == csv_iri {
            artefact.configuration = json!({ "csv_schema": { "layout": "multiple" } });
        }
    }
    let sink = MemoryOutputSink::new();
    generator(&model, specification)
        .generate_artefact(SPECIFICATION, &csv_iri, &sink, &CancellationToken::new())
        .await
        .unwrap();

    let multiple = json_output(&sink, "tourism/person/schema.csv-metadata.json").await;
    let tables = multiple["tables"].as_array().unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0]["tableSchema"]["columns"][0]["name"], "ReferenceId");
    let foreign_key = &tables[1]["tableSchema"]["foreignKeys"][0];
    assert_eq!(foreign_key["columnReference"], "ReferenceId");
    assert_eq!(foreign_key["reference"]["columnReference"], "address");
    assert_eq!(foreign_key["reference"]["resource"], tables[0]["url"]);
}

#[tokio::test]
async fn test_documentation_links_to_anchors() {
    let model = tourism().await;
    let generator = generator(&model, tourism_specification(&model));
    let sink = MemoryOutputSink::new();
    generator
        .generate_specification(SPECIFICATION, &sink, &CancellationToken::new())
        .await
        .unwrap();

    let markdown = sink.get("tourism/index.md").await.unwrap();
    assert!(markdown.starts_with("# Tourism\n"));

    let start = markdown
        .find("<a id=\"conceptual-tourism-osoba-")
        .expect("conceptual class anchor");
    let id_start = start + "<a id=\"".len();
    let id_end = id_start + markdown[id_start..].find('"').unwrap();
    let anchor = &markdown[id_start..id_end];
    assert!(markdown.contains(&format!("(#{})", anchor)));

    assert!(markdown.contains("<a id=\"json-schema-tourism-osoba-"));
    assert!(markdown.contains("<a id=\"xml-schema-tourism-osoba-"));
    assert!(markdown.contains("[schema.json](person/schema.json)"));
}

#[tokio::test]
async fn test_cancelled_run_writes_nothing() {
    let model = tourism().await;
    let generator = generator(&model, tourism_specification(&model));
    let sink = MemoryOutputSink::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = generator.generate_specification(SPECIFICATION, &sink, &cancel).await;
    assert!(matches!(result, Err(ModelError::Cancelled)));
    assert!(sink.paths().await.is_empty());
}

#[tokio::test]
async fn test_unknown_specification_artefact_and_generator() {
    let model = tourism().await;
    let mut specification = tourism_specification(&model);
    specification
        .artefacts
        .push(artefact(&model.psm, "rdf-shapes", "tourism/person/shapes.ttl"));
    specification.artefacts.push(ArtefactDescriptor {
        depends_on: vec!["http://nowhere#json-schema".into()],
        ..artefact(&model.psm, "orphan", "tourism/person/orphan.json")
    });
    let generator = generator(&model, specification);
    let sink = MemoryOutputSink::new();
    let cancel = CancellationToken::new();

    let result = generator.generate_specification("http://nowhere", &sink, &cancel).await;
    assert!(matches!(result, Err(ModelError::MissingSpecification(_))));

    let result = generator
        .generate_artefact(SPECIFICATION, "http://nowhere#json-schema", &sink, &cancel)
        .await;
    assert!(matches!(result, Err(ModelError::MissingArtefact(_))));

    let orphan = format!("{}#orphan", model.psm);
    let result = generator.generate_artefact(SPECIFICATION, &orphan, &sink, &cancel).await;
    assert!(matches!(result, Err(ModelError::MissingArtefact(iri)) if iri == "http://nowhere#json-schema"));

    let shapes = format!("{}#rdf-shapes", model.psm);
    let result = generator.generate_artefact(SPECIFICATION, &shapes, &sink, &cancel).await;
    assert!(matches!(result, Err(ModelError::UnknownGenerator(name)) if name == "rdf-shapes"));
    assert!(sink.paths().await.is_empty());
}

/// Lists the class names of the artefact's structural schema
struct ClassListGenerator;

#[async_trait]
impl ArtefactGenerator for ClassListGenerator {
    fn identifier(&self) -> &'static str {
        "class-list"
    }

    async fn generate_to_stream(
        &self,
        context: &GeneratorContext,
        artefact: &ArtefactDescriptor,
        _specification: &DataSpecification,
        sink: &dyn OutputSink,
    ) -> ModelResult<()> {
        let psm = artefact.psm.as_deref().unwrap_or_default();
        let model = context.structural_model(psm).await?;
        let names: Vec<&str> = model.classes.values().map(|class| class.name()).collect();
        sink.write_path(&artefact.output_path, names.join("\n")).await
    }
}

#[tokio::test]
async fn test_registered_generator_to_directory() {
    let model = tourism().await;
    let mut specification = tourism_specification(&model);
    specification
        .artefacts
        .push(artefact(&model.psm, "class-list", "tourism/person/classes.txt"));
    let generator = generator(&model, specification).register(ClassListGenerator);

    let directory = tempfile::tempdir().unwrap();
    let sink = DirectoryOutputSink::new(directory.path());
    let classes = format!("{}#class-list", model.psm);
    generator
        .generate_artefact(SPECIFICATION, &classes, &sink, &CancellationToken::new())
        .await
        .unwrap();

    let written = std::fs::read_to_string(directory.path().join("tourism/person/classes.txt")).unwrap();
    assert_eq!(written, "person\naddress");

    let result = sink.write_path("../escape.txt", String::new()).await;
    assert!(matches!(result, Err(ModelError::InvalidOutputPath(_))));
}
