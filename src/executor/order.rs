use crate::error::{StoreError, StoreResult};
use crate::operation::{Operation, OperationTag};
use crate::resource::{AttributeKey, AttributeValue};

use super::{mismatched, ExecutionContext, ResourceDiff};

/// Moves one part within its owner's ordered list. The result is always a
/// permutation of the previous list.
pub(super) fn execute(
    operation: &Operation,
    context: &mut ExecutionContext<'_>,
) -> StoreResult<ResourceDiff> {
    let Operation::SetOrder {
        owner,
        moved,
        after,
    } = operation
    else {
        return Err(mismatched(OperationTag::SetOrder, operation));
    };

    let owner_resource = context.require(owner)?;
    if !owner_resource.parts().contains(moved) {
        return Err(StoreError::InvalidReference(format!(
            "{} is not a part of {}",
            moved, owner
        )));
    }

    let mut order: Vec<_> = owner_resource
        .parts()
        .iter()
        .filter(|part| *part != moved)
        .cloned()
        .collect();
    let position = match after {
        None => 0,
        Some(anchor) => {
            order
                .iter()
                .position(|part| part == anchor)
                .ok_or_else(|| {
                    StoreError::InvalidReference(format!(
                        "anchor {} is not a part of {}",
                        anchor, owner
                    ))
                })?
                + 1
        }
    };
    order.insert(position, moved.clone());

    let mut diff = ResourceDiff::default();
    diff.edit(context, owner)?
        .set(AttributeKey::Parts, AttributeValue::IriList(order));
    Ok(diff)
}
