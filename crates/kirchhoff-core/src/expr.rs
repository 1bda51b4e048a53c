//! Immutable algebraic expression tree.
//!
//! `Expr` models the symbolic values that flow through the circuit
//! formulator before a final numeric solve: constants, free variables,
//! node/edge probes, and the small operator set (`+`, `*`, unary negate,
//! unary invert) needed to express Ohm's law coefficients and behavioral
//! source gains.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{CoreError, Result};

/// Unary operators. There is no subtraction or division node: `a - b` is
/// `Add(a, Negate(b))` and `a / b` is `Mul(a, Invert(b))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Invert,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Mul,
}

/// Which quantity a `Probe` resolves to: `V(node)` or `I(edge)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Voltage,
    Current,
}

/// A node of the immutable expression tree.
///
/// Structural equality and hashing are defined so that two trees built
/// independently but shaped the same compare equal; `Constant` compares
/// by bit pattern since `f64` has no native `Eq`/`Hash`.
#[derive(Debug, Clone)]
pub enum Expr {
    Constant(f64),
    Variable(String),
    Probe(ProbeKind, String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Function(String, Vec<Expr>),
    NamedValue(String, Box<Expr>),
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        use Expr::*;
        match (self, other) {
            (Constant(a), Constant(b)) => a.to_bits() == b.to_bits(),
            (Variable(a), Variable(b)) => a == b,
            (Probe(ka, a), Probe(kb, b)) => ka == kb && a == b,
            (Unary(oa, a), Unary(ob, b)) => oa == ob && a == b,
            (Binary(oa, a1, a2), Binary(ob, b1, b2)) => oa == ob && a1 == b1 && a2 == b2,
            (Function(na, aa), Function(nb, ab)) => na == nb && aa == ab,
            (NamedValue(na, a), NamedValue(nb, b)) => na == nb && a == b,
            _ => false,
        }
    }
}
impl Eq for Expr {}

impl std::hash::Hash for Expr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Expr::Constant(v) => v.to_bits().hash(state),
            Expr::Variable(name) => name.hash(state),
            Expr::Probe(kind, name) => {
                kind.hash(state);
                name.hash(state);
            }
            Expr::Unary(op, a) => {
                op.hash(state);
                a.hash(state);
            }
            Expr::Binary(op, a, b) => {
                op.hash(state);
                a.hash(state);
                b.hash(state);
            }
            Expr::Function(name, args) => {
                name.hash(state);
                args.hash(state);
            }
            Expr::NamedValue(name, v) => {
                name.hash(state);
                v.hash(state);
            }
        }
    }
}

/// The canonical `+1` constant.
pub const POS_ONE: Expr = Expr::Constant(1.0);
/// The canonical `0` constant.
pub const ZERO: Expr = Expr::Constant(0.0);
/// The canonical `-1` constant.
pub const NEG_ONE: Expr = Expr::Constant(-1.0);

/// Lookup tables used when rendering or walking an expression tree as text:
/// node name -> potential-variable name, and edge name -> current-variable
/// name. Callers resolve probes through this before printing or inspecting
/// an `Expr` as a string; the formulator's own system-assembly path never
/// goes through `to_source` and builds its equations directly over
/// `LinearTerm`s instead.
#[derive(Debug, Clone, Default)]
pub struct RenderCtx {
    pub node_potential: HashMap<String, String>,
    pub edge_current: HashMap<String, String>,
}

impl Expr {
    pub fn negate(self) -> Expr {
        Expr::Unary(UnaryOp::Negate, Box::new(self))
    }

    pub fn invert(self) -> Expr {
        Expr::Unary(UnaryOp::Invert, Box::new(self))
    }

    pub fn add(self, other: Expr) -> Expr {
        Expr::Binary(BinaryOp::Add, Box::new(self), Box::new(other))
    }

    pub fn mul(self, other: Expr) -> Expr {
        Expr::Binary(BinaryOp::Mul, Box::new(self), Box::new(other))
    }

    /// Numeric value if every leaf is a `Constant`; `NotEvaluable` the
    /// moment a `Variable`, `Probe`, or `Function` is reached.
    pub fn evaluate(&self) -> Result<f64> {
        match self {
            Expr::Constant(v) => Ok(*v),
            Expr::Variable(_) | Expr::Probe(_, _) | Expr::Function(_, _) => {
                Err(CoreError::NotEvaluable)
            }
            Expr::Unary(op, a) => {
                let a = a.evaluate()?;
                Ok(match op {
                    UnaryOp::Negate => -a,
                    UnaryOp::Invert => 1.0 / a,
                })
            }
            Expr::Binary(op, a, b) => {
                let a = a.evaluate()?;
                let b = b.evaluate()?;
                Ok(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Mul => a * b,
                })
            }
            Expr::NamedValue(_, node) => node.evaluate(),
        }
    }

    /// Bottom-up constant folding: simplify children first, then fold the
    /// rebuilt node to a `Constant` if it happens to be fully evaluable.
    pub fn simplify(&self) -> Expr {
        let rebuilt = match self {
            Expr::Constant(_) | Expr::Variable(_) | Expr::Probe(_, _) => return self.clone(),
            Expr::Unary(op, a) => Expr::Unary(*op, Box::new(a.simplify())),
            Expr::Binary(op, a, b) => {
                Expr::Binary(*op, Box::new(a.simplify()), Box::new(b.simplify()))
            }
            Expr::Function(name, args) => {
                Expr::Function(name.clone(), args.iter().map(Expr::simplify).collect())
            }
            Expr::NamedValue(name, node) => {
                Expr::NamedValue(name.clone(), Box::new(node.simplify()))
            }
        };
        match rebuilt.evaluate() {
            Ok(v) => Expr::Constant(v),
            Err(_) => rebuilt,
        }
    }

    /// Direct children, for structural traversal.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Constant(_) | Expr::Variable(_) | Expr::Probe(_, _) => vec![],
            Expr::Unary(_, a) => vec![a.as_ref()],
            Expr::Binary(_, a, b) => vec![a.as_ref(), b.as_ref()],
            Expr::Function(_, args) => args.iter().collect(),
            Expr::NamedValue(_, node) => vec![node.as_ref()],
        }
    }

    /// Render this node as a host-language arithmetic expression string,
    /// resolving probes through `ctx`. Used by `Display` (with an empty,
    /// default `ctx`) for debug/log output of raw expression trees; probe
    /// resolution here is a pure lookup and does not record which edges
    /// were referenced — see [`Expr::referenced_edge_currents`] for that.
    pub fn to_source(&self, ctx: &RenderCtx) -> String {
        match self {
            Expr::Constant(v) => format!("{v:?}"),
            Expr::Variable(name) => name.clone(),
            Expr::Probe(ProbeKind::Voltage, name) => ctx
                .node_potential
                .get(name)
                .cloned()
                .unwrap_or_else(|| panic!("unresolved voltage probe V({name})")),
            Expr::Probe(ProbeKind::Current, name) => ctx
                .edge_current
                .get(name)
                .cloned()
                .unwrap_or_else(|| panic!("unresolved current probe I({name})")),
            Expr::Unary(UnaryOp::Negate, a) => format!("-({})", a.to_source(ctx)),
            Expr::Unary(UnaryOp::Invert, a) => format!("(1 / {})", a.to_source(ctx)),
            Expr::Binary(BinaryOp::Add, a, b) => {
                format!("({} + {})", a.to_source(ctx), b.to_source(ctx))
            }
            Expr::Binary(BinaryOp::Mul, a, b) => {
                format!("({} * {})", a.to_source(ctx), b.to_source(ctx))
            }
            Expr::Function(name, args) => {
                let rendered: Vec<String> = args.iter().map(|a| a.to_source(ctx)).collect();
                format!("{name}({})", rendered.join(", "))
            }
            Expr::NamedValue(_, node) => node.to_source(ctx),
        }
    }

    /// Walk the tree and collect the names of edges referenced by a
    /// `CurrentProbe` whose name matches an entry in `ctx.edge_current`.
    /// A text-rendering counterpart to `to_source`: which probed edges a
    /// behavioral source's defining expression actually depends on. The
    /// formulator determines the same "probed edge needs its own Ohm
    /// equation" fact independently, by walking `LinearTerm`s rather than
    /// this method (see `formulator::total_system`'s `missing` set).
    pub fn referenced_edge_currents(&self, ctx: &RenderCtx) -> HashSet<String> {
        let mut used = HashSet::new();
        self.collect_referenced_edge_currents(ctx, &mut used);
        used
    }

    fn collect_referenced_edge_currents(&self, ctx: &RenderCtx, used: &mut HashSet<String>) {
        if let Expr::Probe(ProbeKind::Current, name) = self {
            if ctx.edge_current.contains_key(name) {
                used.insert(name.clone());
            }
        }
        for child in self.children() {
            child.collect_referenced_edge_currents(ctx, used);
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_source(&RenderCtx::default()))
    }
}
