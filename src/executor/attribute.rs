use crate::error::{StoreError, StoreResult};
use crate::operation::{Operation, OperationTag};
use crate::resource::{AttributeKey, AttributeValue};

use super::{mismatched, ExecutionContext, ResourceDiff};

pub(super) fn execute_set_attribute(
    operation: &Operation,
    context: &mut ExecutionContext<'_>,
) -> StoreResult<ResourceDiff> {
    let Operation::SetAttribute { target, key, value } = operation else {
        return Err(mismatched(OperationTag::SetAttribute, operation));
    };
    if key.is_structural_link() {
        return Err(StoreError::PreconditionFailed(format!(
            "attribute {} is maintained by the store",
            key
        )));
    }
    context.require(target)?;

    if let Some(value) = value {
        if !key.accepts(value) {
            return Err(StoreError::PreconditionFailed(format!(
                "attribute {} has the wrong value type",
                key
            )));
        }
        if let AttributeValue::IriList(parents) = value {
            if *key == AttributeKey::Extends && parents.iter().any(|parent| parent == target) {
                return Err(StoreError::PreconditionFailed(format!(
                    "class {} cannot extend itself",
                    target
                )));
            }
        }
    }

    let mut diff = ResourceDiff::default();
    let resource = diff.edit(context, target)?;
    match value {
        Some(value) => resource.set(*key, value.clone()),
        None => {
            resource.remove(*key);
        }
    }
    Ok(diff)
}

pub(super) fn execute_set_roots(
    operation: &Operation,
    context: &mut ExecutionContext<'_>,
) -> StoreResult<ResourceDiff> {
    let Operation::SetRoots { schema, roots } = operation else {
        return Err(mismatched(OperationTag::SetRoots, operation));
    };
    let schema_resource = context.require(schema)?;
    let schema_kind = schema_resource
        .kind()
        .filter(|kind| kind.is_schema())
        .ok_or_else(|| StoreError::InvalidReference(format!("{} is not a schema", schema)))?;

    for root in roots {
        if !schema_resource.parts().contains(root) {
            return Err(StoreError::InvalidReference(format!(
                "root {} is not a part of schema {}",
                root, schema
            )));
        }
        context.require_as(root, schema_kind.class_type())?;
    }

    let mut diff = ResourceDiff::default();
    diff.edit(context, schema)?
        .set(AttributeKey::Roots, AttributeValue::IriList(roots.clone()));
    Ok(diff)
}
