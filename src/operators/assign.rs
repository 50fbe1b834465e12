//! Assignment: `=`, `|=`, the arithmetic updates `+=`, `-=`, ... and the
//! metadata writes `style=`, `tag=`, `anchor=`, `line_comment=`, `head_comment=`.
//!
//! The left-hand side is evaluated as a target path (missing mapping keys are
//! created) and every node it selects is overwritten in place, so all
//! candidates aliasing that node observe the new value. The operator emits its
//! input candidates, which now reflect the writes.

use super::arithmetic::combine;
use super::metadata::write_metadata;
use super::{string_argument, Operator, OperatorRegistry};
use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::error::{EvalResult, EvaluationError};
use crate::expression::ast::{AssignOp, KindTag, OperatorKind, OperatorNode};
use crate::navigator::TreeNavigator;

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry.register_kind(KindTag::Assign, AssignOperator);
}

pub struct AssignOperator;

impl Operator for AssignOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let op = match node.kind {
            OperatorKind::Assign(op) => op,
            _ => AssignOp::Set,
        };
        let (lhs, rhs) = (node.lhs()?, node.rhs()?);

        for candidate in input {
            let single = std::slice::from_ref(candidate);
            match op {
                AssignOp::Set => {
                    let Some(value) = nav.evaluate_value(single, rhs)?.into_iter().next() else {
                        continue;
                    };
                    for target in targets(nav, single, lhs)? {
                        nav.arena_mut().set_value(target.node, value.node);
                    }
                }
                AssignOp::Update => {
                    for target in targets(nav, single, lhs)? {
                        let updated = nav.evaluate_one(&target, rhs)?;
                        if let Some(value) = updated.first() {
                            nav.arena_mut().set_value(target.node, value.node);
                        }
                    }
                }
                AssignOp::Metadata(field) => {
                    let text = string_argument(nav, field.name(), candidate, rhs)?;
                    for target in nav.evaluate_target(single, lhs)? {
                        write_metadata(nav.arena_mut(), target.node, field, text.clone())?;
                    }
                }
                AssignOp::Arithmetic(arithmetic) => {
                    let Some(value) = nav.evaluate_value(single, rhs)?.into_iter().next() else {
                        continue;
                    };
                    for target in targets(nav, single, lhs)? {
                        let result = combine(nav.arena_mut(), arithmetic, target.node, value.node)?;
                        nav.arena_mut().set_value(target.node, result);
                    }
                }
            }
        }
        Ok(input.to_vec())
    }
}

/// Evaluates the assignment path and checks that every result can be written.
fn targets(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    path: &OperatorNode,
) -> EvalResult<CandidateSequence> {
    let targets = nav.evaluate_target(input, path)?;
    if let Some(computed) = targets
        .iter()
        .find(|target| !nav.arena().is_addressable(target.node))
    {
        tracing::trace!(node = computed.node.index(), "rejecting write to computed node");
        return Err(EvaluationError::NotAddressable {
            operation: "assignment",
        });
    }
    Ok(targets)
}
