//! Combinators: pipe, union, filter, alternative and block.

use super::{is_truthy, Operator, OperatorRegistry};
use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::error::EvalResult;
use crate::expression::ast::{KindTag, OperatorNode};
use crate::navigator::TreeNavigator;

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry.register_kind(KindTag::Pipe, PipeOperator);
    registry.register_kind(KindTag::Union, UnionOperator);
    registry.register_kind(KindTag::Filter, FilterOperator);
    registry.register_kind(KindTag::Alternative, AlternativeOperator);
    registry.register_kind(KindTag::Block, BlockOperator);
}

/// `lhs | rhs`: the results of `lhs` are the input of `rhs`.
///
/// A whole chain runs as a flat list of stages, so a long path uses one level
/// of evaluation depth rather than one per segment.
pub struct PipeOperator;

impl Operator for PipeOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let mut current = input.to_vec();
        for stage in node.pipe_stages()? {
            current = nav.evaluate(&current, stage)?;
        }
        Ok(current)
    }

    fn addresses_input(&self) -> bool {
        true
    }
}

/// `lhs, rhs`: both against the same input, concatenated without dedup.
pub struct UnionOperator;

impl Operator for UnionOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let mut results = nav.evaluate(input, node.lhs()?)?;
        results.extend(nav.evaluate(input, node.rhs()?)?);
        Ok(results)
    }

    fn addresses_input(&self) -> bool {
        true
    }
}

/// `select(p)`: keeps a candidate when `p` yields exactly one truthy value.
pub struct FilterOperator;

impl Operator for FilterOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let predicate = node.lhs()?;
        let mut kept = Vec::new();
        for candidate in input {
            let verdict = nav.evaluate_one(candidate, predicate)?;
            if let [only] = verdict.as_slice() {
                if is_truthy(nav.value(only)) {
                    kept.push(candidate.clone());
                }
            }
        }
        Ok(kept)
    }

    fn addresses_input(&self) -> bool {
        true
    }
}

/// `lhs // rhs`: the truthy results of `lhs`, or the results of `rhs` when
/// there are none. Decided per input candidate.
pub struct AlternativeOperator;

impl Operator for AlternativeOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let (lhs, rhs) = (node.lhs()?, node.rhs()?);
        let mut results = Vec::new();
        for candidate in input {
            let single = std::slice::from_ref(candidate);
            let primary: Vec<CandidateNode> = nav
                .evaluate(single, lhs)?
                .into_iter()
                .filter(|c| is_truthy(nav.value(c)))
                .collect();
            if primary.is_empty() {
                results.extend(nav.evaluate(single, rhs)?);
            } else {
                results.extend(primary);
            }
        }
        Ok(results)
    }

    fn addresses_input(&self) -> bool {
        true
    }
}

/// `lhs; rhs`: evaluates both, keeps the results of `rhs`.
pub struct BlockOperator;

impl Operator for BlockOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        if let Some(first) = node.lhs.as_deref() {
            nav.evaluate(input, first)?;
        }
        nav.evaluate(input, node.rhs()?)
    }
}
