//! Engineering-notation formatting and solved-circuit printing.

use kirchhoff_circuit::{Circuit, CircuitSolution};

/// Decade prefixes from pico to tera, matching the suffixes the parser
/// accepts on the way in.
const PREFIXES: &[(f64, &str)] = &[
    (1e12, "T"),
    (1e9, "G"),
    (1e6, "M"),
    (1e3, "K"),
    (1.0, ""),
    (1e-3, "m"),
    (1e-6, "u"),
    (1e-9, "n"),
    (1e-12, "p"),
];

/// Render `value` using the largest prefix whose magnitude doesn't exceed
/// it, picking the bare unit when `value` falls between 1 and 1000.
/// Anything smaller than `1e-18` in magnitude is printed as a flat zero to
/// avoid engineering-notation noise from solver round-off.
pub fn format_engineering(value: f64, unit: &str) -> String {
    if !value.is_finite() {
        return format!("{value}{unit}");
    }
    let magnitude = value.abs();
    if magnitude < 1e-18 {
        return format!("0{unit}");
    }
    for &(scale, prefix) in PREFIXES {
        if magnitude >= scale {
            return format!("{:.6}{prefix}{unit}", value / scale);
        }
    }
    let (scale, prefix) = *PREFIXES.last().expect("PREFIXES is non-empty");
    format!("{:.6}{prefix}{unit}", value / scale)
}

/// Print a solved circuit's node potentials and edge currents/voltages in
/// sorted-name order, in the teacher's plain `name = value` style.
pub fn print_dc_solution(circuit: &Circuit, solution: &CircuitSolution) {
    println!("Node potentials:");
    for node in circuit.nodes() {
        let v = solution.node_potentials.get(node).copied().unwrap_or(0.0);
        println!("  e({node}) = {}", format_engineering(v, "V"));
    }

    println!("Edge currents and voltages:");
    for edge in circuit.edges() {
        let i = solution.edge_currents.get(&edge.name).copied().unwrap_or(f64::NAN);
        let v = solution.edge_voltages.get(&edge.name).copied().unwrap_or(f64::NAN);
        println!(
            "  {}: i = {}, v = {}",
            edge.name,
            format_engineering(i, "A"),
            format_engineering(v, "V"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_matching_decade_prefix() {
        assert_eq!(format_engineering(2200.0, "ohm"), "2.200000Kohm");
        assert_eq!(format_engineering(0.002, "A"), "2.000000mA");
        assert_eq!(format_engineering(6.0, "V"), "6.000000V");
    }

    #[test]
    fn tera_scale_values_use_the_t_prefix() {
        assert_eq!(format_engineering(5e13, "ohm"), "50.000000Tohm");
    }

    #[test]
    fn tiny_values_collapse_to_zero() {
        assert_eq!(format_engineering(1e-20, "A"), "0A");
        assert_eq!(format_engineering(0.0, "A"), "0A");
    }

    #[test]
    fn negative_values_keep_their_sign() {
        assert_eq!(format_engineering(-0.002, "A"), "-2.000000mA");
    }
}
