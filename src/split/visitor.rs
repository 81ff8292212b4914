//! Per-node pushdown rules.
//!
//! Every node yields a [`VisitOutcome`] whose `value` is the part the remote
//! source evaluates and whose `residual` is the part kept for local
//! evaluation. Parents combine the outcomes of their children:
//!
//! - operators (`Compare`, `Between`, `Like`, `IsNull`, spatial) are pushed
//!   whole only when every operand is pushable and their kind is supported;
//! - `AND` keeps supported children remote and unsupported ones local, and
//!   repeats its feature identifier sets locally when anything stays local;
//! - `NOT` and `OR` are all-or-nothing, `OR` being checked through its
//!   De Morgan form `NOT (NOT a AND NOT b)`.

use std::sync::Arc;

use tonbo_predicate::{
    Expression, Predicate, PredicateNode, PredicateVisitor, SpatialOp, VisitOutcome,
};

use super::{SplitDiagnostic, SplitError};
use crate::{
    capabilities::{Capabilities, PredicateKind},
    option::SplitOptions,
    overlay::TransactionOverlay,
    schema::AttributeSchema,
};

pub(super) type Outcome = VisitOutcome<Predicate>;

/// Working state of one split; dropped once the result is extracted.
pub(super) struct Splitter<'a> {
    pub(super) capabilities: &'a Capabilities,
    pub(super) schema: &'a dyn AttributeSchema,
    pub(super) overlay: Option<&'a dyn TransactionOverlay>,
    pub(super) options: &'a SplitOptions,
    pub(super) depth: usize,
    /// Update filters of pending edits met while walking attribute references.
    pub(super) touched: Vec<Predicate>,
    pub(super) touched_attributes: Vec<Arc<str>>,
    pub(super) diagnostics: Vec<SplitDiagnostic>,
}

impl<'a> Splitter<'a> {
    pub(super) fn new(
        capabilities: &'a Capabilities,
        schema: &'a dyn AttributeSchema,
        overlay: Option<&'a dyn TransactionOverlay>,
        options: &'a SplitOptions,
    ) -> Self {
        Self {
            capabilities,
            schema,
            overlay,
            options,
            depth: 0,
            touched: Vec::new(),
            touched_attributes: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Keeps `predicate` for local evaluation.
    pub(super) fn defer(&self, predicate: Predicate) -> Outcome {
        VisitOutcome::residual(predicate)
    }

    pub(super) fn diagnose(&mut self, diagnostic: SplitDiagnostic) {
        if !self.diagnostics.contains(&diagnostic) {
            self.diagnostics.push(diagnostic);
        }
    }

    pub(super) fn enter(&mut self) -> Result<(), SplitError> {
        if self.depth >= self.options.max_depth {
            return Err(SplitError::DepthLimitExceeded {
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(super) fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Pushes `node` whole when every operand is pushable and `kind` is
    /// supported. Every operand is walked, so pending updates on attributes
    /// of a node kept local are still recorded.
    fn split_operator(
        &mut self,
        node: &Predicate,
        kind: PredicateKind,
        operands: &[&Expression],
    ) -> Result<Outcome, SplitError> {
        let pushable = self.classify_all(operands.iter().copied())?;
        if pushable && self.capabilities.supports(kind) {
            Ok(VisitOutcome::value(node.clone()))
        } else {
            Ok(self.defer(node.clone()))
        }
    }
}

/// `OR` rewritten as `NOT (AND (NOT c1, NOT c2, ...))`, with child outcomes
/// mapped onto the negated clauses.
struct OrRewrite {
    conjunction: Predicate,
    negation: Predicate,
    outcomes: Vec<Outcome>,
}

impl OrRewrite {
    fn new(original: &Predicate, children: Vec<Outcome>) -> Option<Self> {
        let PredicateNode::Or(clauses) = original.kind() else {
            return None;
        };
        if clauses.is_empty() || clauses.len() != children.len() {
            return None;
        }

        let mut negated = Vec::with_capacity(clauses.len());
        let mut outcomes = Vec::with_capacity(clauses.len());
        for (clause, child) in clauses.iter().zip(children) {
            let negated_clause = clause.clone().negate();
            // A negation is pushable only when its operand is entirely pushable.
            outcomes.push(if child.has_residual() {
                VisitOutcome::residual(negated_clause.clone())
            } else {
                VisitOutcome::value(negated_clause.clone())
            });
            negated.push(negated_clause);
        }

        // Built directly so nested conjunctions are not flattened away from
        // their outcomes.
        let conjunction = Predicate::from_node(PredicateNode::And(negated));
        let negation = Predicate::not(conjunction.clone());
        Some(Self {
            conjunction,
            negation,
            outcomes,
        })
    }
}

impl PredicateVisitor for Splitter<'_> {
    type Error = SplitError;
    type Value = Predicate;

    fn visit_predicate(&mut self, predicate: &Predicate) -> Result<Outcome, SplitError> {
        match predicate.kind() {
            PredicateNode::And(clauses) if clauses.is_empty() => {
                return Err(SplitError::EmptyLogical { kind: "AND" });
            }
            PredicateNode::Or(clauses) if clauses.is_empty() => {
                return Err(SplitError::EmptyLogical { kind: "OR" });
            }
            _ => {}
        }

        self.enter()?;
        let outcome = self.visit_node(predicate);
        self.leave();
        let outcome = outcome?;

        // Children are still walked under an unsupported connective so their
        // pending updates are recorded.
        if !predicate.kind().is_leaf() && !self.capabilities.supports(PredicateKind::Logical) {
            return Ok(self.defer(predicate.clone()));
        }
        Ok(outcome)
    }

    fn visit_leaf(&mut self, leaf: &Predicate) -> Result<Outcome, SplitError> {
        match leaf.kind() {
            PredicateNode::MatchAll => Ok(VisitOutcome::empty()),
            PredicateNode::MatchNone => Ok(VisitOutcome::value(leaf.clone())),
            PredicateNode::Compare { left, right, .. } => {
                self.split_operator(leaf, PredicateKind::SimpleComparison, &[left, right])
            }
            PredicateNode::Between { low, test, high } => {
                self.split_operator(leaf, PredicateKind::Between, &[low, test, high])
            }
            PredicateNode::Like { value, .. } => {
                self.split_operator(leaf, PredicateKind::Like, &[value])
            }
            PredicateNode::IsNull { value } => {
                self.split_operator(leaf, PredicateKind::NullCheck, &[value])
            }
            PredicateNode::Spatial {
                op, left, right, ..
            } => self.split_spatial(leaf, *op, left, right),
            PredicateNode::FeatureIds(_) => Ok(VisitOutcome::value(leaf.clone())),
            PredicateNode::Custom { name, args } => {
                self.classify_all(args)?;
                self.diagnose(SplitDiagnostic::UnrecognizedPredicate { name: name.clone() });
                Ok(self.defer(leaf.clone()))
            }
            PredicateNode::Not(_) | PredicateNode::And(_) | PredicateNode::Or(_) => {
                Ok(self.defer(leaf.clone()))
            }
        }
    }

    fn combine_not(&mut self, original: &Predicate, child: Outcome) -> Result<Outcome, SplitError> {
        if child.has_residual() {
            Ok(self.defer(original.clone()))
        } else {
            Ok(VisitOutcome::value(original.clone()))
        }
    }

    fn combine_and(
        &mut self,
        original: &Predicate,
        children: Vec<Outcome>,
    ) -> Result<Outcome, SplitError> {
        if !children.iter().any(VisitOutcome::has_residual) {
            return Ok(VisitOutcome::value(original.clone()));
        }

        let clauses: &[Predicate] = match original.kind() {
            PredicateNode::And(clauses) => clauses.as_slice(),
            _ => &[],
        };
        let mut pushable = Vec::new();
        let mut residual = Vec::new();
        for (idx, child) in children.into_iter().enumerate() {
            // The local side repeats identifier sets.
            if let Some(clause) = clauses.get(idx) {
                if matches!(clause.kind(), PredicateNode::FeatureIds(_)) && !child.has_residual() {
                    residual.push(clause.clone());
                }
            }
            pushable.extend(child.value);
            residual.extend(child.residual);
        }
        Ok(VisitOutcome {
            value: Predicate::conjunction(pushable),
            residual: Predicate::conjunction(residual),
        })
    }

    fn combine_or(
        &mut self,
        original: &Predicate,
        children: Vec<Outcome>,
    ) -> Result<Outcome, SplitError> {
        let Some(rewrite) = OrRewrite::new(original, children) else {
            self.diagnose(SplitDiagnostic::OrRewriteFailed);
            return Ok(self.defer(original.clone()));
        };

        let conjunction = self.combine_and(&rewrite.conjunction, rewrite.outcomes)?;
        let negation = self.combine_not(&rewrite.negation, conjunction)?;
        if negation.has_residual() {
            Ok(self.defer(original.clone()))
        } else {
            Ok(VisitOutcome::value(original.clone()))
        }
    }
}

impl Splitter<'_> {
    fn split_spatial(
        &mut self,
        node: &Predicate,
        op: SpatialOp,
        left: &Expression,
        right: &Expression,
    ) -> Result<Outcome, SplitError> {
        // A geometry side that cannot be evaluated remotely (an unset literal
        // included) keeps the whole relation local rather than rejecting it.
        self.split_operator(node, PredicateKind::Spatial(op), &[left, right])
    }
}
