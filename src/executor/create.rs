use crate::error::{StoreError, StoreResult};
use crate::operation::{Operation, OperationTag};
use crate::resource::{AttributeKey, AttributeValue, Attributes, Iri, Resource, ResourceType};

use super::{mismatched, ExecutionContext, ResourceDiff};

pub(super) fn execute(
    operation: &Operation,
    context: &mut ExecutionContext<'_>,
) -> StoreResult<ResourceDiff> {
    let Operation::Create {
        kind,
        owner,
        attributes,
    } = operation
    else {
        return Err(mismatched(OperationTag::Create, operation));
    };
    check_attributes(*kind, attributes)?;

    match kind {
        ResourceType::ConceptualSchema | ResourceType::StructuralSchema => {
            if let Some(owner) = owner {
                return Err(StoreError::PreconditionFailed(format!(
                    "a schema cannot be owned, got owner {}",
                    owner
                )));
            }
            let mut diff = ResourceDiff::default();
            let iri = context.mint(*kind);
            diff.create(initial(iri, *kind, attributes));
            Ok(diff)
        }
        ResourceType::ConceptualClass
        | ResourceType::StructuralClass
        | ResourceType::StructuralClassReference => {
            let schema = required_owner(*kind, owner)?;
            create_in_schema(context, *kind, schema, attributes)
        }
        ResourceType::ConceptualAttribute
        | ResourceType::StructuralAttribute
        | ResourceType::StructuralAssociationEnd => {
            let owner = required_owner(*kind, owner)?;
            create_class_part(context, *kind, owner, attributes)
        }
        ResourceType::ConceptualAssociation => {
            let schema = required_owner(*kind, owner)?;
            create_association(context, schema, attributes)
        }
        ResourceType::ConceptualAssociationEnd => Err(StoreError::PreconditionFailed(
            "association ends are created together with their association".to_string(),
        )),
    }
}

fn check_attributes(kind: ResourceType, attributes: &Attributes) -> StoreResult<()> {
    for (key, value) in attributes {
        let allowed_link = *key == AttributeKey::Ends && kind == ResourceType::ConceptualAssociation;
        if key.is_structural_link() && !allowed_link {
            return Err(StoreError::PreconditionFailed(format!(
                "attribute {} is maintained by the store",
                key
            )));
        }
        if !key.accepts(value) {
            return Err(StoreError::PreconditionFailed(format!(
                "attribute {} has the wrong value type",
                key
            )));
        }
    }
    Ok(())
}

fn required_owner(kind: ResourceType, owner: &Option<Iri>) -> StoreResult<&str> {
    owner.as_deref().ok_or_else(|| {
        StoreError::PreconditionFailed(format!("a {} must be created inside an owner", kind))
    })
}

fn initial(iri: Iri, kind: ResourceType, attributes: &Attributes) -> Resource {
    let mut resource = Resource::new(iri, kind);
    for (key, value) in attributes {
        if *key != AttributeKey::Ends {
            resource.set(*key, value.clone());
        }
    }
    resource
}

fn create_in_schema(
    context: &mut ExecutionContext<'_>,
    kind: ResourceType,
    schema: &str,
    attributes: &Attributes,
) -> StoreResult<ResourceDiff> {
    context.require_as(schema, kind.schema_type())?;
    let iri = context.mint(kind);
    let resource = initial(iri.clone(), kind, attributes)
        .with(AttributeKey::Schema, AttributeValue::Iri(schema.to_string()));

    let mut diff = ResourceDiff::default();
    diff.create(resource);
    diff.edit(context, schema)?
        .update_iri_list(AttributeKey::Parts, |parts| parts.push(iri));
    Ok(diff)
}

fn create_class_part(
    context: &mut ExecutionContext<'_>,
    kind: ResourceType,
    owner: &str,
    attributes: &Attributes,
) -> StoreResult<ResourceDiff> {
    let owner_class = context.require_as(owner, kind.class_type())?;
    let schema = owner_class
        .iri_ref(AttributeKey::Schema)
        .ok_or_else(|| {
            StoreError::PreconditionFailed(format!("class {} is not part of a schema", owner))
        })?
        .to_string();

    let iri = context.mint(kind);
    let resource = initial(iri.clone(), kind, attributes)
        .with(AttributeKey::Owner, AttributeValue::Iri(owner.to_string()))
        .with(AttributeKey::Schema, AttributeValue::Iri(schema.clone()));

    let mut diff = ResourceDiff::default();
    diff.create(resource);
    diff.edit(context, owner)?
        .update_iri_list(AttributeKey::Parts, |parts| parts.push(iri.clone()));
    diff.edit(context, &schema)?
        .update_iri_list(AttributeKey::Parts, |parts| parts.push(iri));
    Ok(diff)
}

/// Creates the association and both of its ends in one step
fn create_association(
    context: &mut ExecutionContext<'_>,
    schema: &str,
    attributes: &Attributes,
) -> StoreResult<ResourceDiff> {
    context.require_as(schema, ResourceType::ConceptualSchema)?;
    let participants = match attributes.get(&AttributeKey::Ends) {
        Some(AttributeValue::IriList(participants)) if participants.len() == 2 => participants,
        _ => {
            return Err(StoreError::PreconditionFailed(
                "an association needs exactly two participant classes".to_string(),
            ))
        }
    };
    for participant in participants {
        context.require_as(participant, ResourceType::ConceptualClass)?;
    }

    let association = context.mint(ResourceType::ConceptualAssociation);
    let mut diff = ResourceDiff::default();
    let mut ends = Vec::with_capacity(2);
    for participant in participants {
        let end = context.mint(ResourceType::ConceptualAssociationEnd);
        diff.create(
            Resource::new(end.clone(), ResourceType::ConceptualAssociationEnd)
                .with(AttributeKey::Owner, AttributeValue::Iri(association.clone()))
                .with(AttributeKey::Schema, AttributeValue::Iri(schema.to_string()))
                .with(AttributeKey::Range, AttributeValue::IriList(vec![participant.clone()])),
        );
        ends.push(end);
    }
    diff.create(
        initial(association.clone(), ResourceType::ConceptualAssociation, attributes)
            .with(AttributeKey::Schema, AttributeValue::Iri(schema.to_string()))
            .with(AttributeKey::Parts, AttributeValue::IriList(ends.clone())),
    );
    diff.edit(context, schema)?.update_iri_list(AttributeKey::Parts, |parts| {
        parts.push(association);
        parts.extend(ends);
    });
    Ok(diff)
}
