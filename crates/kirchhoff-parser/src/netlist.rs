//! Multi-line SPICE-like netlist parser.
//!
//! Line 1 is the title. `*` lines are comments, `.` lines are ignored
//! directives, everything else is a component line:
//! `<name> <node1> ... <nodeK> <value-expr>`.

use kirchhoff_core::Expr;
use kirchhoff_devices::{ComponentInstance, ComponentRegistry};

use crate::error::{ParseError, Result};
use crate::expr_parser::parse_expr;

/// A fully parsed netlist: title plus the ordered component instances.
#[derive(Debug, Clone)]
pub struct Netlist {
    pub title: String,
    pub components: Vec<ComponentInstance>,
}

/// Split a component line into whitespace-separated tokens, keeping the
/// last token as the (possibly multi-word once whitespace is collapsed)
/// value expression. The grammar requires at least a name and one value
/// token; node count is validated once the class is known.
fn split_component_line(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

fn parse_component_line(
    registry: &ComponentRegistry,
    line_no: usize,
    line: &str,
) -> Result<ComponentInstance> {
    let tokens = split_component_line(line);
    let (name, rest) = tokens
        .split_first()
        .ok_or(ParseError::UnexpectedEof { line: line_no })?;

    if rest.is_empty() {
        return Err(ParseError::Expected {
            line: line_no,
            expected: "at least one node and a value expression",
            found: String::new(),
        });
    }
    let (model_tok, node_toks) = rest.split_last().expect("checked non-empty above");
    let nodes: Vec<String> = node_toks.iter().map(|s| s.to_string()).collect();
    let model = parse_expr(model_tok, line_no)?;

    match registry.find_by_prefix(name) {
        Some(_) => registry
            .build_instance(line, name, nodes, model, None)
            .map_err(|source| ParseError::Device {
                line: line_no,
                source,
            }),
        None => {
            // Behavioral rewrite: the model must be `var_name = body`; the
            // line is re-parsed using `var_name` as the forced class
            // prefix, steering it onto the matching voltage/current class.
            let (var_name, body) = match model {
                Expr::NamedValue(var_name, body) => (var_name, *body),
                _ => return Err(ParseError::BehavioralModelNotAssignment { line: line_no }),
            };
            registry
                .build_instance(line, name, nodes, body, Some(&var_name))
                .map_err(|source| ParseError::Device {
                    line: line_no,
                    source,
                })
        }
    }
}

/// Parse a full netlist source text against the given registry.
pub fn parse_netlist(source: &str, registry: &ComponentRegistry) -> Result<Netlist> {
    let mut title = None;
    let mut components = Vec::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();

        if line.is_empty() {
            continue;
        } else if line_no == 1 {
            title = Some(line.to_string());
        } else if line.starts_with('*') {
            continue;
        } else if line.starts_with('.') {
            continue;
        } else {
            components.push(parse_component_line(registry, line_no, line)?);
        }
    }

    Ok(Netlist {
        title: title.unwrap_or_default(),
        components,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kirchhoff_devices::ComponentClass;

    #[test]
    fn parses_voltage_divider() {
        let reg = ComponentRegistry::new();
        let netlist = parse_netlist(
            "Divider\nV1 a 0 6\nR1 a b 1k\nR2 b 0 2k\n",
            &reg,
        )
        .unwrap();

        assert_eq!(netlist.title, "Divider");
        assert_eq!(netlist.components.len(), 3);
        assert_eq!(netlist.components[0].class, ComponentClass::VoltageSource);
        assert_eq!(netlist.components[1].nodes, vec!["a", "b"]);
    }

    #[test]
    fn engineering_suffix_yields_expected_conductance() {
        // S5: "2.2k" resistor conductance evaluates to 1/2200.
        let reg = ComponentRegistry::new();
        let netlist = parse_netlist("Resistor\nR1 a 0 2.2k\n", &reg).unwrap();
        let r1 = &netlist.components[0];
        let g = r1.conductance().unwrap().evaluate().unwrap();
        assert!((g - 1.0 / 2200.0).abs() < 1e-12);
    }

    #[test]
    fn ignores_comments_and_directives() {
        let reg = ComponentRegistry::new();
        let netlist = parse_netlist(
            "Title\n* a comment\n.op\nR1 a 0 1k\n",
            &reg,
        )
        .unwrap();
        assert_eq!(netlist.components.len(), 1);
    }

    #[test]
    fn behavioral_line_is_rewritten_onto_voltage_source() {
        let reg = ComponentRegistry::new();
        let netlist = parse_netlist(
            "Gain\nV1 a 0 3\nR1 a b 1k\nE1 c 0 vs=2*V(b)\nR2 c 0 1k\n",
            &reg,
        )
        .unwrap();

        let e1 = netlist
            .components
            .iter()
            .find(|c| c.name == "E1")
            .expect("E1 present");
        assert_eq!(e1.class, ComponentClass::VoltageSource);
        assert!(e1.constant_voltage().is_some());
    }

    #[test]
    fn unknown_prefix_without_assignment_is_an_error() {
        let reg = ComponentRegistry::new();
        let err = parse_netlist("Title\nZ1 a 0 5\n", &reg).unwrap_err();
        assert!(matches!(err, ParseError::BehavioralModelNotAssignment { line: 2 }));
    }
}
