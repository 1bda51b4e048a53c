//! Equation formulator: turns a [`Circuit`] into a square system of linear
//! equations over node potentials and edge currents.
//!
//! The pipeline mirrors the five named equation sets and their
//! substitutions:
//!
//! 1. [`EquationFormulator::ohms_law`] / [`EquationFormulator::kcl`] /
//!    [`EquationFormulator::kvl`] build the raw, per-edge/per-node
//!    equations.
//! 2. [`EquationFormulator::node_potential_substituted_ohms_law`] folds KVL
//!    into Ohm's law, turning each resistor's current into a function of
//!    node potentials.
//! 3. [`EquationFormulator::substituted_kcl`] folds that into KCL, leaving
//!    only node potentials and non-resistor edge currents as unknowns.
//! 4. [`EquationFormulator::expressions_for_current`] /
//!    [`EquationFormulator::expressions_for_voltage`] /
//!    [`EquationFormulator::expressions_for_potential`] supply the
//!    source-value equations (independent or behavioral) that pin the
//!    remaining unknowns, plus the ground constraint.
//! 5. [`EquationFormulator::total_system`] assembles all of the above into
//!    one square system, eliminating the first (by sorted name) node's KCL
//!    row in favor of the ground constraint and injecting any resistor's
//!    Ohm equation that a behavioral source's current probe still needs.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use kirchhoff_core::{CircuitVariable, Expr, LinearEquation, LinearEquationSet, LinearTerm, LinearTerms, NEG_ONE, POS_ONE};

use crate::error::{CircuitError, Result};
use crate::graph::{Circuit, GROUND};

/// The numerically solved circuit: node potentials plus every edge's
/// current and voltage, the latter two derived from node potentials and
/// Ohm's law for edges that were eliminated from the system by
/// substitution.
#[derive(Debug, Clone, Default)]
pub struct CircuitSolution {
    pub node_potentials: HashMap<String, f64>,
    pub edge_currents: HashMap<String, f64>,
    pub edge_voltages: HashMap<String, f64>,
}

fn collect_vars(terms: &LinearTerms, out: &mut HashSet<CircuitVariable>) {
    for term in terms.terms() {
        if !term.element.is_const() {
            out.insert(term.element.clone());
        }
    }
}

pub struct EquationFormulator<'a> {
    circuit: &'a Circuit,
}

impl<'a> EquationFormulator<'a> {
    pub fn new(circuit: &'a Circuit) -> Self {
        EquationFormulator { circuit }
    }

    /// `I_edge = G · V_edge`, one equation per edge with a conductance.
    pub fn ohms_law(&self) -> LinearEquationSet {
        let mut set = LinearEquationSet::empty();
        for edge in self.circuit.edges() {
            if let Some(g) = edge.conductance() {
                set.push(LinearEquation::new(
                    LinearTerms::from(CircuitVariable::EdgeCurrent(edge.name.clone())),
                    LinearTerms::from(LinearTerm::new(
                        g,
                        CircuitVariable::EdgeVoltage(edge.name.clone()),
                    )),
                ));
            }
        }
        set
    }

    /// The signed sum of incident edge currents at each node is zero, one
    /// equation per node, in sorted node order.
    pub fn kcl(&self) -> LinearEquationSet {
        let mut set = LinearEquationSet::empty();
        for node in self.circuit.nodes() {
            let terms: Vec<LinearTerm> = self
                .circuit
                .ports_with_node(node)
                .into_iter()
                .map(|p| {
                    LinearTerm::new(
                        Expr::Constant(p.current_flow as f64),
                        CircuitVariable::EdgeCurrent(p.edge.name.clone()),
                    )
                })
                .collect();
            set.push(LinearEquation::new(LinearTerms(terms), LinearTerms::empty()));
        }
        set
    }

    /// `V_edge = E_high - E_low`, one equation per edge.
    pub fn kvl(&self) -> LinearEquationSet {
        let mut set = LinearEquationSet::empty();
        for edge in self.circuit.edges() {
            set.push(LinearEquation::new(
                LinearTerms::from(CircuitVariable::EdgeVoltage(edge.name.clone())),
                LinearTerms::sum([
                    LinearTerm::new(
                        POS_ONE,
                        CircuitVariable::NodePotential(edge.high_node().to_string()),
                    ),
                    LinearTerm::new(
                        NEG_ONE,
                        CircuitVariable::NodePotential(edge.low_node().to_string()),
                    ),
                ]),
            ));
        }
        set
    }

    pub fn node_potential_substituted_ohms_law(&self) -> Result<LinearEquationSet> {
        Ok(self.ohms_law().substitute_from(&self.kvl())?)
    }

    pub fn substituted_kcl(&self) -> Result<LinearEquationSet> {
        Ok(self
            .kcl()
            .substitute_from(&self.node_potential_substituted_ohms_law()?)?)
    }

    /// `I_edge = j`, one equation per edge with a constant (possibly
    /// behavioral) current.
    pub fn expressions_for_current(&self) -> Result<LinearEquationSet> {
        let mut set = LinearEquationSet::empty();
        for edge in self.circuit.edges() {
            if let Some(j) = edge.constant_current() {
                set.push(LinearEquation::new(
                    LinearTerms::from(CircuitVariable::EdgeCurrent(edge.name.clone())),
                    j.to_linear_terms()?,
                ));
            }
        }
        Ok(set)
    }

    /// `V_edge = e`, one equation per edge with a constant (possibly
    /// behavioral) voltage.
    pub fn expressions_for_voltage(&self) -> Result<LinearEquationSet> {
        let mut set = LinearEquationSet::empty();
        for edge in self.circuit.edges() {
            if let Some(e) = edge.constant_voltage() {
                set.push(LinearEquation::new(
                    LinearTerms::from(CircuitVariable::EdgeVoltage(edge.name.clone())),
                    e.to_linear_terms()?,
                ));
            }
        }
        Ok(set)
    }

    /// `expressions_for_voltage`, rewritten in terms of node potentials via
    /// KVL, plus the ground constraint `E_0 = 0`.
    pub fn expressions_for_potential(&self) -> Result<LinearEquationSet> {
        let mut set = self.expressions_for_voltage()?.substitute_from(&self.kvl())?;
        if self.circuit.has_ground() {
            set.push(LinearEquation::new(
                LinearTerms::from(CircuitVariable::NodePotential(GROUND.to_string())),
                LinearTerms::empty(),
            ));
        }
        Ok(set)
    }

    /// The assembled square system: the distinct unknowns it covers (sorted
    /// by canonical name) and the equations themselves.
    pub fn total_system(&self) -> Result<(Vec<CircuitVariable>, LinearEquationSet)> {
        let substituted_kcl = self.substituted_kcl()?;
        let mut total = LinearEquationSet::empty();
        // Drop the first (by sorted node name) node's KCL row; the ground
        // constraint supplies the missing equation instead.
        for eq in substituted_kcl.equations().iter().skip(1) {
            total.push(eq.clone());
        }
        total.extend(self.expressions_for_potential()?);
        total.extend(self.expressions_for_current()?);

        // A behavioral source's current probe may reference a resistor
        // whose current was eliminated by substitution and so has no
        // defining equation of its own yet. Inject one per such edge.
        let ohm_by_var = self.node_potential_substituted_ohms_law()?.var_to_formula()?;
        let mut defined: HashSet<CircuitVariable> = HashSet::new();
        for eq in total.equations() {
            if eq.left.is_single() {
                defined.insert(eq.left.first().unwrap().element.clone());
            }
        }
        let mut referenced = HashSet::new();
        for eq in total.equations() {
            collect_vars(&eq.left, &mut referenced);
            collect_vars(&eq.right, &mut referenced);
        }
        let mut missing: Vec<&CircuitVariable> = referenced
            .iter()
            .filter(|v| !defined.contains(*v) && ohm_by_var.contains_key(*v))
            .collect();
        missing.sort_by_key(|v| v.canonical_name());
        if !missing.is_empty() {
            trace!(
                "formulator: injecting {} extra Ohm equation(s) for probed edge currents eliminated by substitution",
                missing.len()
            );
        }
        for var in missing {
            let formula = ohm_by_var.get(var).expect("checked contains_key above").clone();
            total.push(LinearEquation::new(LinearTerms::from(var.clone()), formula));
        }

        let mut unknowns = HashSet::new();
        for eq in total.equations() {
            collect_vars(&eq.left, &mut unknowns);
            collect_vars(&eq.right, &mut unknowns);
        }
        let mut unknowns: Vec<CircuitVariable> = unknowns.into_iter().collect();
        unknowns.sort_by_key(|v| v.canonical_name());

        if total.len() != unknowns.len() {
            return Err(CircuitError::NotSquare {
                equations: total.len(),
                unknowns: unknowns.len(),
            });
        }
        debug!(
            "formulator: assembled a square system of {} equations over {} unknowns",
            total.len(),
            unknowns.len()
        );

        Ok((unknowns, total))
    }

    /// The total system as a dense augmented matrix (`n` rows, `n + 1`
    /// columns) in the returned unknown order, ready for [`EquationFormulator::total_system`]'s
    /// caller to hand to a linear solver.
    pub fn assemble_numeric(&self) -> Result<(Vec<CircuitVariable>, Vec<Vec<f64>>)> {
        let (unknowns, total) = self.total_system()?;
        let index: HashMap<&CircuitVariable, usize> = unknowns
            .iter()
            .enumerate()
            .map(|(i, v)| (v, i))
            .collect();

        let mut matrix = Vec::with_capacity(total.len());
        for eq in total.equations() {
            let split = eq.split_vars_and_const();
            let mut row = vec![0.0; unknowns.len() + 1];
            for term in split.left.terms() {
                let idx = index[&term.element];
                row[idx] += term.k.evaluate()?;
            }
            let mut rhs = 0.0;
            for term in split.right.terms() {
                rhs += term.k.evaluate()?;
            }
            row[unknowns.len()] = rhs;
            matrix.push(row);
        }
        Ok((unknowns, matrix))
    }

    /// Turn a solved unknown vector back into per-node and per-edge
    /// quantities, deriving edge voltages from node potentials (KVL) and
    /// any eliminated resistor current from Ohm's law.
    pub fn build_solution(&self, unknowns: &[CircuitVariable], x: &[f64]) -> Result<CircuitSolution> {
        let solved: HashMap<CircuitVariable, f64> = unknowns
            .iter()
            .cloned()
            .zip(x.iter().copied())
            .collect();

        let mut node_potentials = HashMap::new();
        for node in self.circuit.nodes() {
            let value = solved
                .get(&CircuitVariable::NodePotential(node.clone()))
                .copied()
                .unwrap_or(0.0);
            node_potentials.insert(node.clone(), value);
        }

        let mut edge_currents = HashMap::new();
        let mut edge_voltages = HashMap::new();
        for edge in self.circuit.edges() {
            let high = node_potentials.get(edge.high_node()).copied().unwrap_or(0.0);
            let low = node_potentials.get(edge.low_node()).copied().unwrap_or(0.0);
            let voltage = high - low;
            edge_voltages.insert(edge.name.clone(), voltage);

            let current = if let Some(i) = solved.get(&CircuitVariable::EdgeCurrent(edge.name.clone())) {
                *i
            } else if let Some(g) = edge.conductance() {
                g.evaluate()? * voltage
            } else {
                f64::NAN
            };
            edge_currents.insert(edge.name.clone(), current);
        }

        Ok(CircuitSolution {
            node_potentials,
            edge_currents,
            edge_voltages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kirchhoff_devices::ComponentRegistry;

    fn build(source: &str) -> Circuit {
        let registry = ComponentRegistry::new();
        let netlist = kirchhoff_parser::parse_netlist(source, &registry).unwrap();
        Circuit::from_instances(netlist.components).unwrap()
    }

    #[test]
    fn voltage_divider_solves_to_expected_node_potentials() {
        // S1-style divider: V1=6V across R1=1k, R2=2k in series, tap at b.
        let circuit = build("Divider\nV1 a 0 6\nR1 a b 1k\nR2 b 0 2k\n");
        let formulator = EquationFormulator::new(&circuit);
        let (unknowns, matrix) = formulator.assemble_numeric().unwrap();

        assert_eq!(unknowns.len(), matrix.len());
        // Expect exactly one equation defining e_a = 6 directly.
        assert!(unknowns.contains(&CircuitVariable::NodePotential("a".into())));
        assert!(unknowns.contains(&CircuitVariable::NodePotential("b".into())));
        assert!(unknowns.contains(&CircuitVariable::EdgeCurrent("V1".into())));
        // Resistor currents are eliminated by substitution, not unknowns.
        assert!(!unknowns.contains(&CircuitVariable::EdgeCurrent("R1".into())));
    }

    #[test]
    fn behavioral_source_current_probe_injects_ohm_equation() {
        let circuit = build("Gain\nV1 a 0 3\nR1 a b 1k\nE1 c 0 vs=2*I(R1)\nR2 c 0 1k\n");
        let formulator = EquationFormulator::new(&circuit);
        let (unknowns, _matrix) = formulator.assemble_numeric().unwrap();
        // R1's current is now referenced by E1's behavioral value, so it
        // must appear as an unknown with its own injected Ohm equation.
        assert!(unknowns.contains(&CircuitVariable::EdgeCurrent("R1".into())));
    }

    #[test]
    fn ground_equation_fixes_potential_zero() {
        let circuit = build("Single\nV1 a 0 5\nR1 a 0 1k\n");
        let formulator = EquationFormulator::new(&circuit);
        let (_, total) = formulator.total_system().unwrap();
        let has_ground_eq = total.equations().iter().any(|eq| {
            eq.left.is_single()
                && eq.left.first().unwrap().element == CircuitVariable::NodePotential("0".into())
                && eq.right.terms().is_empty()
        });
        assert!(has_ground_eq);
    }
}
