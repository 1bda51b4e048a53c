//! The circuit as a graph: nodes are bare names, edges are component
//! instances. Node "0" is distinguished only by convention (it is the
//! ground reference the formulator pins to zero); the graph itself treats
//! every node identically.

use std::collections::BTreeSet;

use kirchhoff_devices::ComponentInstance;

use crate::error::{CircuitError, Result};

/// A reference to one port of one edge, with the signed current direction
/// used when assembling KCL at the node it is bound to.
#[derive(Debug, Clone, Copy)]
pub struct PortRef<'a> {
    pub edge: &'a ComponentInstance,
    pub port: &'static str,
    pub current_flow: i32,
}

/// The ground node name. Fixed at zero potential regardless of whether any
/// component actually binds to it.
pub const GROUND: &str = "0";

/// An assembled circuit: component instances ("edges") plus the set of
/// distinct node names they mention.
#[derive(Debug, Clone)]
pub struct Circuit {
    edges: Vec<ComponentInstance>,
    nodes: Vec<String>,
}

impl Circuit {
    /// Build a circuit from parsed component instances, sorted by name for
    /// deterministic iteration order. Rejects duplicate instance names.
    pub fn from_instances(mut instances: Vec<ComponentInstance>) -> Result<Circuit> {
        instances.sort_by(|a, b| a.name.cmp(&b.name));
        let mut seen = BTreeSet::new();
        for inst in &instances {
            if !seen.insert(inst.name.clone()) {
                return Err(CircuitError::DuplicateName(inst.name.clone()));
            }
        }

        let mut nodes: BTreeSet<String> = BTreeSet::new();
        for inst in &instances {
            nodes.extend(inst.nodes.iter().cloned());
        }

        Ok(Circuit {
            edges: instances,
            nodes: nodes.into_iter().collect(),
        })
    }

    /// Edges (component instances), sorted by name.
    pub fn edges(&self) -> &[ComponentInstance] {
        &self.edges
    }

    /// Distinct node names, sorted ascending. `"0"` sorts first whenever it
    /// appears, since ASCII digits precede ASCII letters.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn has_ground(&self) -> bool {
        self.nodes.iter().any(|n| n == GROUND)
    }

    pub fn edge_by_name(&self, name: &str) -> Option<&ComponentInstance> {
        self.edges.iter().find(|e| e.name == name)
    }

    /// Every port binding incident to `node`, across every edge.
    pub fn ports_with_node(&self, node: &str) -> Vec<PortRef<'_>> {
        self.edges
            .iter()
            .flat_map(|edge| {
                edge.ports_bound_to(node)
                    .into_iter()
                    .map(move |(port, current_flow)| PortRef {
                        edge,
                        port,
                        current_flow,
                    })
            })
            .collect()
    }
}
