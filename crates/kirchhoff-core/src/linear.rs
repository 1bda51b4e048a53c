//! Linear term algebra: `LinearTerm`, `LinearTerms`, `LinearEquation`, and
//! `LinearEquationSet`, with arithmetic and substitution (`<<`).
//!
//! Equations are kept symbolic until after substitution collapses them, so
//! engineering coefficients (like `1/R`) stay as expressions and are
//! constant-folded once, at the end, rather than on every intermediate
//! step.

use std::collections::HashMap;

use crate::error::{CoreError, Result};
use crate::expr::{BinaryOp, Expr, ProbeKind, UnaryOp};
use crate::variable::CircuitVariable;

impl Expr {
    /// Lower this expression into linear terms over circuit variables,
    /// resolving probes directly to `NodePotential`/`EdgeCurrent` elements
    /// rather than leaving them as tree nodes. Fails the moment the tree
    /// stops being a linear combination of probes and constants, e.g. a
    /// product of two probes or an unresolved function call.
    pub fn to_linear_terms(&self) -> Result<LinearTerms> {
        match self {
            Expr::Constant(v) => Ok(LinearTerms::from(Expr::Constant(*v))),
            Expr::Probe(ProbeKind::Voltage, name) => Ok(LinearTerms::from(
                CircuitVariable::NodePotential(name.clone()),
            )),
            Expr::Probe(ProbeKind::Current, name) => Ok(LinearTerms::from(
                CircuitVariable::EdgeCurrent(name.clone()),
            )),
            Expr::Unary(UnaryOp::Negate, a) => Ok(a.to_linear_terms()?.neg()),
            Expr::Unary(UnaryOp::Invert, a) => {
                let v = a.evaluate().map_err(|_| {
                    CoreError::TypeError("cannot invert a non-constant expression".to_string())
                })?;
                Ok(LinearTerms::from(Expr::Constant(1.0 / v)))
            }
            Expr::Binary(BinaryOp::Add, a, b) => {
                Ok(a.to_linear_terms()?.add(&b.to_linear_terms()?))
            }
            Expr::Binary(BinaryOp::Mul, a, b) => {
                if let Ok(k) = a.evaluate() {
                    Ok(b.to_linear_terms()?.scale(&Expr::Constant(k)))
                } else if let Ok(k) = b.evaluate() {
                    Ok(a.to_linear_terms()?.scale(&Expr::Constant(k)))
                } else {
                    Err(CoreError::TypeError(
                        "product of two non-constant terms is not linear".to_string(),
                    ))
                }
            }
            Expr::NamedValue(_, node) => node.to_linear_terms(),
            Expr::Variable(name) => Err(CoreError::TypeError(format!(
                "free variable {name:?} cannot appear in a circuit value"
            ))),
            Expr::Function(name, _) => Err(CoreError::TypeError(format!(
                "unresolved function {name:?} cannot appear in a circuit value"
            ))),
        }
    }
}

/// `k · element`. `k` is always simplified after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTerm {
    pub k: Expr,
    pub element: CircuitVariable,
}

impl LinearTerm {
    pub fn new(k: Expr, element: CircuitVariable) -> Self {
        LinearTerm {
            k: k.simplify(),
            element,
        }
    }

    /// A bare variable reference, `1 · element`.
    pub fn unit(element: CircuitVariable) -> Self {
        LinearTerm::new(Expr::Constant(1.0), element)
    }

    /// A pure constant, `k · Const`.
    pub fn constant(k: Expr) -> Self {
        LinearTerm::new(k, CircuitVariable::Const)
    }

    pub fn neg(&self) -> LinearTerm {
        LinearTerm::new(self.k.clone().negate(), self.element.clone())
    }

    /// `self * scalar`, where `scalar` may be any expression (typically a
    /// coefficient being distributed over a substitution).
    pub fn scale(&self, scalar: &Expr) -> LinearTerm {
        LinearTerm::new(scalar.clone().mul(self.k.clone()), self.element.clone())
    }
}

/// Ordered list of `LinearTerm`s. Arithmetic treats this as a vector of
/// terms: addition concatenates, multiplication distributes, and no
/// like-term combining is performed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearTerms(pub Vec<LinearTerm>);

impl LinearTerms {
    pub fn empty() -> Self {
        LinearTerms(Vec::new())
    }

    pub fn terms(&self) -> &[LinearTerm] {
        &self.0
    }

    pub fn is_single(&self) -> bool {
        self.0.len() == 1
    }

    pub fn first(&self) -> Option<&LinearTerm> {
        self.0.first()
    }

    pub fn neg(&self) -> LinearTerms {
        LinearTerms(self.0.iter().map(LinearTerm::neg).collect())
    }

    pub fn add(&self, other: &LinearTerms) -> LinearTerms {
        let mut terms = self.0.clone();
        terms.extend(other.0.iter().cloned());
        LinearTerms(terms)
    }

    pub fn sub(&self, other: &LinearTerms) -> LinearTerms {
        self.add(&other.neg())
    }

    pub fn scale(&self, scalar: &Expr) -> LinearTerms {
        LinearTerms(self.0.iter().map(|t| t.scale(scalar)).collect())
    }

    /// Flatten an iterable of term-like inputs (`LinearTerms`, a single
    /// `LinearTerm`, or anything coercible via [`Coerce`]) into one
    /// `LinearTerms`.
    pub fn sum<I, T>(items: I) -> LinearTerms
    where
        I: IntoIterator<Item = T>,
        T: Into<LinearTerms>,
    {
        let mut terms = Vec::new();
        for item in items {
            terms.extend(item.into().0);
        }
        LinearTerms(terms)
    }

    /// Split into (variable-side terms, constant-side terms).
    pub fn split_vars_and_const(&self) -> (LinearTerms, LinearTerms) {
        let (constants, vars): (Vec<_>, Vec<_>) =
            self.0.iter().cloned().partition(|t| t.element.is_const());
        (LinearTerms(vars), LinearTerms(constants))
    }

    /// Substitute `self << src`: for each term `k·v`, if `v` is the lone
    /// left-hand variable of some equation `v = F(...)` in `src`, replace
    /// the term with `F · k`; otherwise keep it unchanged. Not transitive:
    /// apply again for a second round if needed.
    pub fn substitute(&self, src: &LinearEquationSet) -> Result<LinearTerms> {
        let formulas = src.var_to_formula()?;
        let mut result = Vec::new();
        for term in &self.0 {
            match formulas.get(&term.element) {
                Some(formula) => result.extend(formula.scale(&term.k).0),
                None => result.push(term.clone()),
            }
        }
        Ok(LinearTerms(result))
    }
}

impl From<LinearTerm> for LinearTerms {
    fn from(t: LinearTerm) -> Self {
        LinearTerms(vec![t])
    }
}

impl From<CircuitVariable> for LinearTerms {
    fn from(v: CircuitVariable) -> Self {
        LinearTerms(vec![LinearTerm::unit(v)])
    }
}

impl From<Expr> for LinearTerms {
    fn from(e: Expr) -> Self {
        LinearTerms(vec![LinearTerm::constant(e)])
    }
}

impl From<f64> for LinearTerms {
    fn from(v: f64) -> Self {
        if v == 0.0 {
            LinearTerms::empty()
        } else {
            LinearTerms(vec![LinearTerm::constant(Expr::Constant(v))])
        }
    }
}

/// `left = right`, kept as two symbolic term lists rather than a single
/// zeroed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearEquation {
    pub left: LinearTerms,
    pub right: LinearTerms,
}

impl LinearEquation {
    pub fn new(left: LinearTerms, right: LinearTerms) -> Self {
        LinearEquation { left, right }
    }

    pub fn from_left(left: impl Into<LinearTerms>) -> Self {
        LinearEquation::new(left.into(), LinearTerms::empty())
    }

    pub fn neg(&self) -> LinearEquation {
        LinearEquation::new(self.left.neg(), self.right.neg())
    }

    pub fn add(&self, other: &LinearEquation) -> LinearEquation {
        LinearEquation::new(self.left.add(&other.left), self.right.add(&other.right))
    }

    pub fn sub(&self, other: &LinearEquation) -> LinearEquation {
        LinearEquation::new(self.left.sub(&other.left), self.right.sub(&other.right))
    }

    pub fn split_vars_and_const(&self) -> LinearEquation {
        let (left_vars, left_const) = self.left.split_vars_and_const();
        let (right_vars, right_const) = self.right.split_vars_and_const();
        LinearEquation::new(left_vars.sub(&right_vars), right_const.sub(&left_const))
    }

    /// Valid only when `left` has exactly one term `k·v`; returns
    /// `(v, right · k⁻¹)`.
    pub fn var_to_formula(&self) -> Result<(CircuitVariable, LinearTerms)> {
        if !self.left.is_single() {
            return Err(CoreError::ShapeError(format!(
                "left-hand side must have exactly one term, has {}",
                self.left.terms().len()
            )));
        }
        let term = self.left.first().expect("checked is_single above");
        let inv_k = term.k.clone().invert();
        Ok((term.element.clone(), self.right.scale(&inv_k)))
    }

    pub fn substitute(&self, src: &LinearEquationSet) -> Result<LinearEquation> {
        Ok(LinearEquation::new(
            self.left.substitute(src)?,
            self.right.substitute(src)?,
        ))
    }
}

/// Ordered list of `LinearEquation`s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearEquationSet(pub Vec<LinearEquation>);

impl LinearEquationSet {
    pub fn new(equations: Vec<LinearEquation>) -> Self {
        LinearEquationSet(equations)
    }

    pub fn empty() -> Self {
        LinearEquationSet(Vec::new())
    }

    pub fn equations(&self) -> &[LinearEquation] {
        &self.0
    }

    pub fn push(&mut self, eq: LinearEquation) {
        self.0.push(eq);
    }

    pub fn extend(&mut self, other: LinearEquationSet) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a `variable -> right_side` map, requiring every equation to
    /// have exactly one left-hand term.
    pub fn var_to_formula(&self) -> Result<HashMap<CircuitVariable, LinearTerms>> {
        self.0.iter().map(LinearEquation::var_to_formula).collect()
    }

    /// `dst <<= src`, applied to both sides of every equation in `self`.
    /// A no-op when `src` is empty.
    pub fn substitute_from(&self, src: &LinearEquationSet) -> Result<LinearEquationSet> {
        if src.is_empty() {
            return Ok(self.clone());
        }
        let equations = self
            .0
            .iter()
            .map(|eq| eq.substitute(src))
            .collect::<Result<Vec<_>>>()?;
        Ok(LinearEquationSet(equations))
    }
}

impl IntoIterator for LinearEquationSet {
    type Item = LinearEquation;
    type IntoIter = std::vec::IntoIter<LinearEquation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> CircuitVariable {
        CircuitVariable::NodePotential(name.to_string())
    }

    #[test]
    fn substitution_is_noop_on_empty_source() {
        let dst = LinearEquationSet::new(vec![LinearEquation::from_left(var("a"))]);
        let result = dst.substitute_from(&LinearEquationSet::empty()).unwrap();
        assert_eq!(result, dst);
    }

    #[test]
    fn split_vars_and_const_preserves_total_value() {
        // 2a + 5 = 3a - 3  =>  -a = -8  (same root: a = 8 either way)
        let left = LinearTerms::sum([
            LinearTerms::from(LinearTerm::new(Expr::Constant(2.0), var("a"))),
            LinearTerms::from(Expr::Constant(5.0)),
        ]);
        let right = LinearTerms::sum([
            LinearTerms::from(LinearTerm::new(Expr::Constant(3.0), var("a"))),
            LinearTerms::from(Expr::Constant(-3.0)),
        ]);
        let eq = LinearEquation::new(left, right).split_vars_and_const();

        let lhs_value: f64 = eq
            .left
            .terms()
            .iter()
            .map(|t| t.k.evaluate().unwrap())
            .sum();
        let rhs_value: f64 = eq
            .right
            .terms()
            .iter()
            .map(|t| t.k.evaluate().unwrap())
            .sum();
        assert_eq!(lhs_value, -1.0);
        assert_eq!(rhs_value, -8.0);
        assert_eq!(rhs_value / lhs_value, 8.0);
    }

    #[test]
    fn substitution_replaces_matching_single_term_lhs() {
        // src: b = 2*a ; dst: 3*b = 5
        let src = LinearEquationSet::new(vec![LinearEquation::new(
            LinearTerms::from(var("b")),
            LinearTerms::from(LinearTerm::new(Expr::Constant(2.0), var("a"))),
        )]);
        let dst = LinearEquationSet::new(vec![LinearEquation::new(
            LinearTerms::from(LinearTerm::new(Expr::Constant(3.0), var("b"))),
            LinearTerms::from(Expr::Constant(5.0)),
        )]);
        let result = dst.substitute_from(&src).unwrap();
        let term = &result.equations()[0].left.terms()[0];
        assert_eq!(term.element, var("a"));
        assert_eq!(term.k.evaluate().unwrap(), 6.0);
    }

    #[test]
    fn var_to_formula_rejects_multi_term_lhs() {
        let eq = LinearEquation::new(
            LinearTerms::sum([LinearTerms::from(var("a")), LinearTerms::from(var("b"))]),
            LinearTerms::empty(),
        );
        assert!(matches!(eq.var_to_formula(), Err(CoreError::ShapeError(_))));
    }

    #[test]
    fn linear_combination_of_probes_lowers_cleanly() {
        // 2*V(b) + -V(a)
        let e = Expr::Constant(2.0)
            .mul(Expr::Probe(ProbeKind::Voltage, "b".into()))
            .add(Expr::Probe(ProbeKind::Voltage, "a".into()).negate());
        let terms = e.to_linear_terms().unwrap();
        assert_eq!(terms.terms().len(), 2);
        assert_eq!(terms.terms()[0].element, var("b"));
        assert_eq!(terms.terms()[0].k.evaluate().unwrap(), 2.0);
        assert_eq!(terms.terms()[1].element, var("a"));
        assert_eq!(terms.terms()[1].k.evaluate().unwrap(), -1.0);
    }

    #[test]
    fn product_of_two_probes_is_not_linear() {
        let e = Expr::Probe(ProbeKind::Voltage, "a".into())
            .mul(Expr::Probe(ProbeKind::Current, "r1".into()));
        assert!(matches!(e.to_linear_terms(), Err(CoreError::TypeError(_))));
    }
}
