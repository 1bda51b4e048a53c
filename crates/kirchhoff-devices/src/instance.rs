//! A parsed netlist line bound to a component class.

use kirchhoff_core::Expr;

use crate::class::ComponentClass;

/// One parsed `<name> <node1> ... <nodeK> <value-expr>` line.
#[derive(Debug, Clone)]
pub struct ComponentInstance {
    /// Original source line, kept for diagnostics and behavioral re-parse.
    pub source_line: String,
    pub class: ComponentClass,
    pub name: String,
    /// Nodes bound to the class's ports, in port order.
    pub nodes: Vec<String>,
    /// The parsed value expression (`ComponentModel` in the original).
    pub model: Expr,
}

impl ComponentInstance {
    pub fn conductance(&self) -> Option<Expr> {
        self.class.conductance(&self.model)
    }

    pub fn constant_voltage(&self) -> Option<Expr> {
        self.class.constant_voltage(&self.model)
    }

    pub fn constant_current(&self) -> Option<Expr> {
        self.class.constant_current(&self.model)
    }

    fn port_index(&self, port: &str) -> Option<usize> {
        self.class.ports().iter().position(|p| *p == port)
    }

    pub fn port_to_node(&self, port: &str) -> Option<&str> {
        self.port_index(port).map(|i| self.nodes[i].as_str())
    }

    pub fn node_to_port(&self, node: &str) -> Option<&'static str> {
        self.nodes
            .iter()
            .position(|n| n == node)
            .map(|i| self.class.ports()[i])
    }

    pub fn high_node(&self) -> &str {
        self.port_to_node(self.class.port_high())
            .expect("port bindings match class arity")
    }

    pub fn low_node(&self) -> &str {
        self.port_to_node(self.class.port_low())
            .expect("port bindings match class arity")
    }

    /// `(component, port-name, current-flow)` triples for every port of
    /// this instance bound to `node`. A port appears at most once since
    /// ports are distinct node bindings, but a two-terminal device whose
    /// ports are both tied to the same node yields two entries.
    pub fn ports_bound_to(&self, node: &str) -> Vec<(&'static str, i32)> {
        self.class
            .ports()
            .iter()
            .zip(self.nodes.iter())
            .filter(|(_, n)| n.as_str() == node)
            .map(|(port, _)| (*port, self.class.current_flow(port)))
            .collect()
    }
}
