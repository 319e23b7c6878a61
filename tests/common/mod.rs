//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use specforge::datatype::KnownDatatype;
use specforge::specification::generators;
use specforge::{
    ArtefactDescriptor, AttributeKey, AttributeValue, Cardinality, DataSpecification, LanguageString,
    MemoryStore, Operation, ResourceDiff, ResourceType,
};

pub const BASE: &str = "http://localhost";
pub const SPECIFICATION: &str = "http://localhost/specification/tourism";

/// IRI of the single resource of `kind` created by `diff`
pub fn created(diff: &ResourceDiff, kind: ResourceType) -> String {
    diff.created
        .values()
        .find(|resource| resource.is(kind))
        .map(|resource| resource.iri().to_string())
        .expect("operation created a resource of the requested kind")
}

pub fn text(value: &str) -> AttributeValue {
    AttributeValue::Text(value.to_string())
}

pub fn iri(value: &str) -> AttributeValue {
    AttributeValue::Iri(value.to_string())
}

pub async fn apply(store: &MemoryStore, operation: Operation, kind: ResourceType) -> String {
    let diff = store.apply_operation(operation).await.expect("operation applies");
    created(&diff, kind)
}

/// IRIs of the tourism model
pub struct Tourism {
    pub store: Arc<MemoryStore>,
    pub pim: String,
    pub pim_person: String,
    pub pim_name: String,
    pub psm: String,
    pub person: String,
    pub name: String,
    pub age: String,
    pub address_end: String,
    pub address: String,
    pub street: String,
}

/// A person with a required name, an optional age and an optional address.
/// The name's bounds are only stated on the conceptual attribute.
pub async fn tourism() -> Tourism {
    let store = Arc::new(MemoryStore::new(BASE));
    let string = KnownDatatype::String.iri();

    let pim = apply(
        &store,
        Operation::create(ResourceType::ConceptualSchema, None)
            .with_attribute(AttributeKey::HumanLabel, LanguageString::of("en", "Tourism")),
        ResourceType::ConceptualSchema,
    )
    .await;
    let pim_person = apply(
        &store,
        Operation::create(ResourceType::ConceptualClass, Some(&pim))
            .with_attribute(AttributeKey::HumanLabel, LanguageString::of("en", "Person").with("cs", "Osoba"))
            .with_attribute(AttributeKey::ConceptIri, iri("https://slovník.gov.cz/osoba")),
        ResourceType::ConceptualClass,
    )
    .await;
    let pim_name = apply(
        &store,
        Operation::create(ResourceType::ConceptualAttribute, Some(&pim_person))
            .with_attribute(AttributeKey::HumanLabel, LanguageString::of("en", "Name"))
            .with_attribute(AttributeKey::Datatype, iri(&string))
            .with_attribute(AttributeKey::Cardinality, Cardinality::exactly_one()),
        ResourceType::ConceptualAttribute,
    )
    .await;

    let psm = apply(
        &store,
        Operation::create(ResourceType::StructuralSchema, None)
            .with_attribute(AttributeKey::HumanLabel, LanguageString::of("en", "Person schema"))
            .with_attribute(AttributeKey::TechnicalLabel, text("person-schema"))
            .with_attribute(AttributeKey::Namespace, text("https://example.com/person/"))
            .with_attribute(AttributeKey::NamespacePrefix, text("per")),
        ResourceType::StructuralSchema,
    )
    .await;
    let person = apply(
        &store,
        Operation::create(ResourceType::StructuralClass, Some(&psm))
            .with_attribute(AttributeKey::TechnicalLabel, text("person"))
            .with_attribute(AttributeKey::Interpretation, iri(&pim_person)),
        ResourceType::StructuralClass,
    )
    .await;
    let name = apply(
        &store,
        Operation::create(ResourceType::StructuralAttribute, Some(&person))
            .with_attribute(AttributeKey::TechnicalLabel, text("name"))
            .with_attribute(AttributeKey::Interpretation, iri(&pim_name))
            .with_attribute(AttributeKey::Datatype, iri(&string)),
        ResourceType::StructuralAttribute,
    )
    .await;
    let age = apply(
        &store,
        Operation::create(ResourceType::StructuralAttribute, Some(&person))
            .with_attribute(AttributeKey::TechnicalLabel, text("age"))
            .with_attribute(AttributeKey::Datatype, iri(&KnownDatatype::Integer.iri()))
            .with_attribute(AttributeKey::Cardinality, Cardinality::new(0, Some(1))),
        ResourceType::StructuralAttribute,
    )
    .await;

    let address = apply(
        &store,
        Operation::create(ResourceType::StructuralClass, Some(&psm))
            .with_attribute(AttributeKey::TechnicalLabel, text("address")),
        ResourceType::StructuralClass,
    )
    .await;
    let street = apply(
        &store,
        Operation::create(ResourceType::StructuralAttribute, Some(&address))
            .with_attribute(AttributeKey::TechnicalLabel, text("street"))
            .with_attribute(AttributeKey::Datatype, iri(&string))
            .with_attribute(AttributeKey::Cardinality, Cardinality::exactly_one()),
        ResourceType::StructuralAttribute,
    )
    .await;
    let address_end = apply(
        &store,
        Operation::create(ResourceType::StructuralAssociationEnd, Some(&person))
            .with_attribute(AttributeKey::TechnicalLabel, text("address"))
            .with_attribute(AttributeKey::Range, AttributeValue::IriList(vec![address.clone()]))
            .with_attribute(AttributeKey::Cardinality, Cardinality::new(0, Some(1))),
        ResourceType::StructuralAssociationEnd,
    )
    .await;

    store
        .apply_operation(Operation::set_roots(&psm, vec![person.clone()]))
        .await
        .expect("roots are set");

    Tourism {
        store,
        pim,
        pim_person,
        pim_name,
        psm,
        person,
        name,
        age,
        address_end,
        address,
        street,
    }
}

pub fn artefact(psm: &str, generator: &str, output_path: &str) -> ArtefactDescriptor {
    ArtefactDescriptor {
        iri: format!("{}#{}", psm, generator),
        generator: generator.to_string(),
        output_path: output_path.to_string(),
        public_url: format!("https://example.com/{}", output_path),
        psm: Some(psm.to_string()),
        depends_on: Vec::new(),
        configuration: serde_json::Value::Null,
    }
}

/// Specification over the tourism model with one artefact per format
pub fn tourism_specification(model: &Tourism) -> DataSpecification {
    let json = artefact(&model.psm, generators::JSON_SCHEMA, "tourism/person/schema.json");
    let xsd = artefact(&model.psm, generators::XML_SCHEMA, "tourism/person/schema.xsd");
    let csv = artefact(&model.psm, generators::CSV_SCHEMA, "tourism/person/schema.csv-metadata.json");
    let documentation = ArtefactDescriptor {
        iri: format!("{}#{}", SPECIFICATION, generators::DOCUMENTATION),
        generator: generators::DOCUMENTATION.to_string(),
        output_path: "tourism/index.md".to_string(),
        public_url: "https://example.com/tourism/index.md".to_string(),
        psm: None,
        depends_on: vec![json.iri.clone(), xsd.iri.clone(), csv.iri.clone()],
        configuration: serde_json::Value::Null,
    };

    DataSpecification {
        iri: SPECIFICATION.to_string(),
        label: LanguageString::of("en", "Tourism"),
        conceptual_schema: Some(model.pim.clone()),
        structural_schemas: vec![model.psm.clone()],
        imported_specifications: Vec::new(),
        artefacts: vec![documentation, json, xsd, csv],
    }
}
