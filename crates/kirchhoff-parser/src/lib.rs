//! Netlist and expression parser for Kirchhoff.

pub mod error;
pub mod expr_parser;
pub mod netlist;

pub use error::{ParseError, Result};
pub use expr_parser::parse_expr;
pub use netlist::{parse_netlist, Netlist};
