use tonbo_predicate::{AttributeRef, Expression};

use super::{visitor::Splitter, SplitDiagnostic, SplitError};
use crate::capabilities::ExpressionKind;

/// Where an expression can be evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Placement {
    Pushable,
    Local,
}

impl Placement {
    fn from_flag(pushable: bool) -> Self {
        if pushable {
            Placement::Pushable
        } else {
            Placement::Local
        }
    }

    pub(super) fn is_pushable(self) -> bool {
        matches!(self, Placement::Pushable)
    }
}

impl Splitter<'_> {
    /// Decides whether `expr` can be evaluated by the remote source.
    pub(super) fn classify(&mut self, expr: &Expression) -> Result<Placement, SplitError> {
        self.enter()?;
        let placement = self.classify_inner(expr);
        self.leave();
        placement
    }

    /// Classifies every expression without stopping at the first local one;
    /// returns true when all of them are pushable.
    pub(super) fn classify_all<'e, I>(&mut self, exprs: I) -> Result<bool, SplitError>
    where
        I: IntoIterator<Item = &'e Expression>,
    {
        let mut pushable = true;
        for expr in exprs {
            pushable &= self.classify(expr)?.is_pushable();
        }
        Ok(pushable)
    }

    fn classify_inner(&mut self, expr: &Expression) -> Result<Placement, SplitError> {
        match expr {
            Expression::Attribute(attribute) => self.classify_attribute(attribute),
            Expression::Literal(value) if value.is_null() => Ok(Placement::Local),
            Expression::Literal(_) => Ok(Placement::Pushable),
            Expression::Math { left, right, .. } => {
                let operands = self.classify_all([&**left, &**right])?;
                let supported = self
                    .capabilities
                    .supports_expression(ExpressionKind::SimpleArithmetic);
                Ok(Placement::from_flag(operands && supported))
            }
            Expression::Function { name, args } => {
                let arguments = self.classify_all(args)?;
                let Some(name) = name else {
                    self.diagnose(SplitDiagnostic::UnnamedFunction);
                    return Ok(Placement::Local);
                };
                Ok(Placement::from_flag(
                    arguments && self.capabilities.supports_function(name),
                ))
            }
        }
    }

    /// Attributes are pushable when the schema knows them. Pending updates
    /// on the attribute are recorded whether or not the schema knows it.
    fn classify_attribute(&mut self, attribute: &AttributeRef) -> Result<Placement, SplitError> {
        if let Some(update) = self
            .overlay
            .and_then(|overlay| overlay.update_filter(&attribute.path))
        {
            if !self.touched.contains(&update) {
                self.touched.push(update);
            }
            if !self.touched_attributes.contains(&attribute.path) {
                self.touched_attributes.push(attribute.path.clone());
            }
        }

        if self.schema.contains(&attribute.path) {
            return Ok(Placement::Pushable);
        }
        if self.options.strict_attributes {
            return Err(SplitError::UnknownAttribute {
                path: attribute.path.to_string(),
            });
        }
        self.diagnose(SplitDiagnostic::UnknownAttribute {
            path: attribute.path.clone(),
        });
        Ok(Placement::Local)
    }
}
