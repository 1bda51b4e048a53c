//! Component class catalog entries.
//!
//! The original dispatches through stored closures (`g_proc`/`e_proc`/
//! `j_proc`) attached to a class record. Here each class is a variant
//! whose producer is a direct expression template, matched on rather than
//! called: a resistor's `g` is always `invert(value)`, a source's `e`/`j`
//! is always the raw value expression (which may itself contain probes,
//! which is exactly what makes a source "behavioral").

use kirchhoff_core::Expr;

/// Catalog entry for a component species. Current-flow signs are fixed at
/// `(+1, -1)`: current always enters the high port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentClass {
    /// `R`: `g = 1 / value`.
    Resistor,
    /// `V`: `e = value` (may contain probes for a behavioral source).
    VoltageSource,
    /// `I`: `j = value` (may contain probes for a behavioral source).
    CurrentSource,
}

pub const REGISTRY_ORDER: [ComponentClass; 3] = [
    ComponentClass::Resistor,
    ComponentClass::VoltageSource,
    ComponentClass::CurrentSource,
];

impl ComponentClass {
    pub fn display_name(&self) -> &'static str {
        match self {
            ComponentClass::Resistor => "Resistor",
            ComponentClass::VoltageSource => "V-source",
            ComponentClass::CurrentSource => "I-source",
        }
    }

    /// Case-insensitive prefix this class claims on the leading letters of
    /// an instance name.
    pub fn prefix(&self) -> &'static str {
        match self {
            ComponentClass::Resistor => "r",
            ComponentClass::VoltageSource => "v",
            ComponentClass::CurrentSource => "i",
        }
    }

    pub fn port_high(&self) -> &'static str {
        match self {
            ComponentClass::Resistor => "begin",
            ComponentClass::VoltageSource => "pos",
            ComponentClass::CurrentSource => "pos",
        }
    }

    pub fn port_low(&self) -> &'static str {
        match self {
            ComponentClass::Resistor => "end",
            ComponentClass::VoltageSource => "neg",
            ComponentClass::CurrentSource => "neg",
        }
    }

    pub fn ports(&self) -> [&'static str; 2] {
        [self.port_high(), self.port_low()]
    }

    pub fn num_ports(&self) -> usize {
        2
    }

    /// `+1` for the high port, `-1` for the low port. Panics if `port`
    /// names neither; callers only ever pass a port name drawn from
    /// [`ComponentClass::ports`].
    pub fn current_flow(&self, port: &str) -> i32 {
        if port == self.port_high() {
            1
        } else if port == self.port_low() {
            -1
        } else {
            panic!("{port:?} is not a port of {self:?}");
        }
    }

    /// `g_proc`: present only for resistors.
    pub fn conductance(&self, value: &Expr) -> Option<Expr> {
        match self {
            ComponentClass::Resistor => Some(value.clone().invert()),
            _ => None,
        }
    }

    /// `e_proc`: present only for voltage sources (independent or
    /// behavioral).
    pub fn constant_voltage(&self, value: &Expr) -> Option<Expr> {
        match self {
            ComponentClass::VoltageSource => Some(value.clone()),
            _ => None,
        }
    }

    /// `j_proc`: present only for current sources (independent or
    /// behavioral).
    pub fn constant_current(&self, value: &Expr) -> Option<Expr> {
        match self {
            ComponentClass::CurrentSource => Some(value.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resistor_exposes_only_conductance() {
        let r = ComponentClass::Resistor;
        let value = Expr::Constant(1000.0);
        assert!(r.conductance(&value).is_some());
        assert!(r.constant_voltage(&value).is_none());
        assert!(r.constant_current(&value).is_none());
    }

    #[test]
    fn current_flow_signs() {
        let v = ComponentClass::VoltageSource;
        assert_eq!(v.current_flow("pos"), 1);
        assert_eq!(v.current_flow("neg"), -1);
    }
}
