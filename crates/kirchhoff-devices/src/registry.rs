//! Immutable, ordered catalog of component classes.

use kirchhoff_core::Expr;

use crate::class::{ComponentClass, REGISTRY_ORDER};
use crate::error::{DeviceError, Result};
use crate::instance::ComponentInstance;

/// Holds the default catalog in a fixed lookup order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentRegistry;

impl ComponentRegistry {
    pub fn new() -> Self {
        ComponentRegistry
    }

    /// The first class whose prefix is a case-insensitive prefix of
    /// `name`.
    pub fn find_by_prefix(&self, name: &str) -> Option<ComponentClass> {
        let lower = name.to_lowercase();
        REGISTRY_ORDER
            .iter()
            .copied()
            .find(|class| lower.starts_with(class.prefix()))
    }

    /// Bind a tokenized netlist line (name, ordered node list, and an
    /// already-parsed value expression) to a component class.
    ///
    /// `force_prefix` overrides class selection (used for the behavioral
    /// rewrite in the parser, where the class is picked by the assigned
    /// variable's name rather than the instance name).
    pub fn build_instance(
        &self,
        source_line: &str,
        name: &str,
        nodes: Vec<String>,
        model: Expr,
        force_prefix: Option<&str>,
    ) -> Result<ComponentInstance> {
        let class = match force_prefix {
            Some(prefix) => self
                .find_by_prefix(prefix)
                .ok_or_else(|| DeviceError::UnknownPrefix {
                    name: prefix.to_string(),
                })?,
            None => self
                .find_by_prefix(name)
                .ok_or_else(|| DeviceError::UnknownPrefix {
                    name: name.to_string(),
                })?,
        };

        if nodes.len() != class.num_ports() {
            return Err(DeviceError::PortArityMismatch {
                class: class.display_name(),
                name: name.to_string(),
                expected: class.num_ports(),
                actual: nodes.len(),
            });
        }

        Ok(ComponentInstance {
            source_line: source_line.to_string(),
            class,
            name: name.to_string(),
            nodes,
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_resistor_case_insensitively() {
        let reg = ComponentRegistry::new();
        assert_eq!(reg.find_by_prefix("R1"), Some(ComponentClass::Resistor));
        assert_eq!(reg.find_by_prefix("r1"), Some(ComponentClass::Resistor));
    }

    #[test]
    fn unknown_prefix_is_absent() {
        let reg = ComponentRegistry::new();
        assert_eq!(reg.find_by_prefix("E1"), None);
    }

    #[test]
    fn build_instance_checks_arity() {
        let reg = ComponentRegistry::new();
        let err = reg
            .build_instance("R1 a 1000", "R1", vec!["a".into()], Expr::Constant(1000.0), None)
            .unwrap_err();
        assert!(matches!(err, DeviceError::PortArityMismatch { .. }));
    }

    #[test]
    fn force_prefix_picks_class_by_assigned_variable_name() {
        // `vs=2*V(b)` steers a behavioral line onto the voltage-source class.
        let reg = ComponentRegistry::new();
        let ins = reg
            .build_instance(
                "E1 c 0 vs=2*V(b)",
                "E1",
                vec!["c".into(), "0".into()],
                Expr::Constant(0.0),
                Some("vs"),
            )
            .unwrap();
        assert_eq!(ins.class, ComponentClass::VoltageSource);
    }
}
