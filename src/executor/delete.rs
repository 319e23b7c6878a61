use crate::error::{StoreError, StoreResult};
use crate::operation::{Operation, OperationTag};
use crate::resource::{AttributeKey, Resource, ResourceType};

use super::{mismatched, ExecutionContext, ResourceDiff};

pub(super) fn execute(
    operation: &Operation,
    context: &mut ExecutionContext<'_>,
) -> StoreResult<ResourceDiff> {
    let Operation::Delete { target } = operation else {
        return Err(mismatched(OperationTag::Delete, operation));
    };
    let resource = context.require(target)?;
    let kind = resource
        .kind()
        .ok_or_else(|| StoreError::PreconditionFailed(format!("{} has no type", target)))?;

    let mut diff = ResourceDiff::default();
    match kind {
        ResourceType::ConceptualSchema | ResourceType::StructuralSchema => {
            require_empty(resource, "schema")?;
        }
        ResourceType::ConceptualClass | ResourceType::StructuralClass => {
            require_empty(resource, "class")?;
            detach_from_owners(context, &mut diff, resource)?;
        }
        ResourceType::ConceptualAssociation => {
            for end in resource.parts() {
                if let Some(end_resource) = context.read(end) {
                    detach_from_owners(context, &mut diff, end_resource)?;
                }
                diff.delete(end);
            }
            detach_from_owners(context, &mut diff, resource)?;
        }
        ResourceType::ConceptualAssociationEnd => {
            return Err(StoreError::PreconditionFailed(format!(
                "association end {} can only be deleted with its association",
                target
            )));
        }
        ResourceType::ConceptualAttribute
        | ResourceType::StructuralAttribute
        | ResourceType::StructuralAssociationEnd
        | ResourceType::StructuralClassReference => {
            detach_from_owners(context, &mut diff, resource)?;
        }
    }
    diff.delete(target);
    Ok(diff)
}

fn require_empty(resource: &Resource, what: &str) -> StoreResult<()> {
    if resource.parts().is_empty() {
        Ok(())
    } else {
        Err(StoreError::PreconditionFailed(format!(
            "only an empty {} can be deleted, {} still owns {} resources",
            what,
            resource.iri(),
            resource.parts().len()
        )))
    }
}

/// Remove `resource` from the ordered lists of its owner and its schema
fn detach_from_owners(
    context: &ExecutionContext<'_>,
    diff: &mut ResourceDiff,
    resource: &Resource,
) -> StoreResult<()> {
    let iri = resource.iri();
    for link in [AttributeKey::Owner, AttributeKey::Schema] {
        let Some(holder) = resource.iri_ref(link) else {
            continue;
        };
        if context.read(holder).is_none() || diff.deleted.contains(holder) {
            continue;
        }
        let holder_resource = diff.edit(context, holder)?;
        holder_resource.detach(AttributeKey::Parts, iri);
        if holder_resource.iri_list(AttributeKey::Roots).iter().any(|root| root == iri) {
            holder_resource.detach(AttributeKey::Roots, iri);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{CounterIdentifiers, IdentifierCounters};
    use crate::resource::AttributeValue;
    use std::collections::BTreeMap;

    fn iri_list(items: &[&str]) -> AttributeValue {
        AttributeValue::IriList(items.iter().map(|i| i.to_string()).collect())
    }

    fn store() -> BTreeMap<String, Resource> {
        let schema = Resource::new("s", ResourceType::StructuralSchema)
            .with(AttributeKey::Parts, iri_list(&["c", "e"]))
            .with(AttributeKey::Roots, iri_list(&["c"]));
        let class = Resource::new("c", ResourceType::StructuralClass)
            .with(AttributeKey::Schema, AttributeValue::Iri("s".into()))
            .with(AttributeKey::Parts, iri_list(&["e"]));
        let end = Resource::new("e", ResourceType::StructuralAssociationEnd)
            .with(AttributeKey::Schema, AttributeValue::Iri("s".into()))
            .with(AttributeKey::Owner, AttributeValue::Iri("c".into()));
        [schema, class, end]
            .into_iter()
            .map(|r| (r.iri().to_string(), r))
            .collect()
    }

    fn run(resources: &BTreeMap<String, Resource>, target: &str) -> StoreResult<ResourceDiff> {
        let mut context =
            ExecutionContext::new(resources, &CounterIdentifiers, "http://x", IdentifierCounters::default());
        execute(&Operation::delete(target), &mut context)
    }

    #[test]
    fn test_delete_non_empty_class_fails() {
        let resources = store();
        assert!(matches!(run(&resources, "c"), Err(StoreError::PreconditionFailed(_))));
    }

    #[test]
    fn test_delete_association_end_detaches() {
        let diff = run(&store(), "e").unwrap();
        assert_eq!(diff.deleted.iter().collect::<Vec<_>>(), ["e"]);
        assert_eq!(diff.changed["c"].parts(), &[] as &[String]);
        assert_eq!(diff.changed["s"].parts(), ["c"]);
        assert!(diff.created.is_empty());
    }

    #[test]
    fn test_delete_class_removes_root() {
        let mut resources = store();
        resources.get_mut("c").unwrap().set(AttributeKey::Parts, iri_list(&[]));
        let diff = run(&resources, "c").unwrap();
        assert!(diff.changed["s"].iri_list(AttributeKey::Roots).is_empty());
        assert_eq!(diff.changed["s"].parts(), ["e"]);
        assert!(diff.is_disjoint());
    }
}
