// SPDX-License-Identifier: Apache-2.0

//! Loader for line-oriented `.bench` netlists.
//!
//! Accepted statements, one per line, whitespace insignificant:
//!
//! ```text
//! INPUT(<name>)
//! OUTPUT(<name>)
//! <name> = <TYPE>(<op1>,<op2>,...)
//! ```
//!
//! `#` starts a comment that runs to the end of the line. Names may be
//! defined (as an input or a gate output) at most once, but may be used
//! before their definition.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::netlist::circuit::{Circuit, GateKind, NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetlistErrorKind {
    /// A primary input or gate output name was defined twice.
    DuplicateDefinition(String),
    /// A fanin or output refers to a name that is never defined.
    UndefinedNet(String),
    /// The line is not one of the three statement forms.
    Malformed(String),
    /// A known gate type was given the wrong number of operands.
    Arity {
        gate: String,
        kind: GateKind,
        actual: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetlistError {
    /// 1-based line of the offending statement.
    pub lineno: u32,
    pub kind: NetlistErrorKind,
}

impl fmt::Display for NetlistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "netlist line {}: ", self.lineno)?;
        match &self.kind {
            NetlistErrorKind::DuplicateDefinition(name) => {
                write!(f, "line \"{}\" already exists previously in netlist", name)
            }
            NetlistErrorKind::UndefinedNet(name) => {
                write!(f, "line \"{}\" is used but never defined", name)
            }
            NetlistErrorKind::Malformed(text) => write!(f, "malformed statement: {}", text),
            NetlistErrorKind::Arity { gate, kind, actual } => {
                let (min, max) = kind.arity();
                let expected = match max {
                    Some(max) if max == min => format!("{}", min),
                    Some(max) => format!("{}..={}", min, max),
                    None => format!("at least {}", min),
                };
                write!(
                    f,
                    "{} gate \"{}\" takes {} operand(s), got {}",
                    kind, gate, expected, actual
                )
            }
        }
    }
}

impl std::error::Error for NetlistError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Statement {
    Input(String),
    Output(String),
    Gate {
        name: String,
        type_name: String,
        operands: Vec<String>,
    },
}

/// Splits `HEAD(a,b,c)` into `("HEAD", ["a", "b", "c"])`.
fn split_call(s: &str) -> Option<(&str, Vec<&str>)> {
    let open = s.find('(')?;
    if !s.ends_with(')') || open == 0 {
        return None;
    }
    let head = &s[..open];
    let inner = &s[open + 1..s.len() - 1];
    if inner.contains('(') || inner.contains(')') {
        return None;
    }
    let operands: Vec<&str> = if inner.is_empty() {
        Vec::new()
    } else {
        inner.split(',').collect()
    };
    if operands.iter().any(|op| op.is_empty()) {
        return None;
    }
    Some((head, operands))
}

fn is_valid_name(s: &str) -> bool {
    !s.is_empty() && !s.contains(|c| matches!(c, '(' | ')' | ',' | '='))
}

fn parse_statement(line: &str) -> Option<Statement> {
    if let Some((lhs, rhs)) = line.split_once('=') {
        if !is_valid_name(lhs) {
            return None;
        }
        let (type_name, operands) = split_call(rhs)?;
        return Some(Statement::Gate {
            name: lhs.to_string(),
            type_name: type_name.to_string(),
            operands: operands.into_iter().map(str::to_string).collect(),
        });
    }
    let (keyword, operands) = split_call(line)?;
    if operands.len() != 1 {
        return None;
    }
    let name = operands[0].to_string();
    match keyword.to_ascii_uppercase().as_str() {
        "INPUT" => Some(Statement::Input(name)),
        "OUTPUT" => Some(Statement::Output(name)),
        _ => None,
    }
}

/// Strips the comment and all whitespace from a raw line.
fn clean_line(raw: &str) -> String {
    let code = match raw.find('#') {
        Some(i) => &raw[..i],
        None => raw,
    };
    code.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parses netlist text into a [`Circuit`] named `name`.
pub fn parse_netlist_str(name: &str, text: &str) -> Result<Circuit, NetlistError> {
    let mut statements: Vec<(u32, Statement)> = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let lineno = (i + 1) as u32;
        let line = clean_line(raw);
        if line.is_empty() {
            continue;
        }
        let statement = parse_statement(&line).ok_or_else(|| NetlistError {
            lineno,
            kind: NetlistErrorKind::Malformed(raw.trim().to_string()),
        })?;
        statements.push((lineno, statement));
    }

    // Definitions first, so operands may name wires defined further down.
    let mut ids: AHashMap<&str, NodeId> = AHashMap::new();
    let mut kinds: Vec<(Arc<str>, NodeKind)> = Vec::new();
    let mut inputs: Vec<NodeId> = Vec::new();
    let mut gates: Vec<NodeId> = Vec::new();
    for (lineno, statement) in &statements {
        let (wire, kind) = match statement {
            Statement::Input(wire) => (wire, NodeKind::PrimaryInput),
            Statement::Gate {
                name, type_name, ..
            } => {
                let kind = match type_name.parse::<GateKind>() {
                    Ok(kind) => NodeKind::Gate(kind),
                    Err(_) => NodeKind::Opaque(type_name.to_ascii_uppercase()),
                };
                (name, kind)
            }
            Statement::Output(_) => continue,
        };
        if ids.contains_key(wire.as_str()) {
            return Err(NetlistError {
                lineno: *lineno,
                kind: NetlistErrorKind::DuplicateDefinition(wire.clone()),
            });
        }
        let id = NodeId(kinds.len());
        ids.insert(wire.as_str(), id);
        if kind == NodeKind::PrimaryInput {
            inputs.push(id);
        } else {
            gates.push(id);
        }
        kinds.push((Arc::from(wire.as_str()), kind));
    }

    let resolve = |lineno: u32, wire: &str| -> Result<NodeId, NetlistError> {
        ids.get(wire).copied().ok_or_else(|| NetlistError {
            lineno,
            kind: NetlistErrorKind::UndefinedNet(wire.to_string()),
        })
    };

    let mut fanins: Vec<Vec<NodeId>> = vec![Vec::new(); kinds.len()];
    let mut outputs: Vec<NodeId> = Vec::new();
    for (lineno, statement) in &statements {
        match statement {
            Statement::Input(_) => {}
            Statement::Output(wire) => outputs.push(resolve(*lineno, wire)?),
            Statement::Gate { name, operands, .. } => {
                let id = resolve(*lineno, name)?;
                if let NodeKind::Gate(kind) = kinds[id.0].1 {
                    let (min, max) = kind.arity();
                    if operands.len() < min || max.map_or(false, |max| operands.len() > max) {
                        return Err(NetlistError {
                            lineno: *lineno,
                            kind: NetlistErrorKind::Arity {
                                gate: name.clone(),
                                kind,
                                actual: operands.len(),
                            },
                        });
                    }
                }
                fanins[id.0] = operands
                    .iter()
                    .map(|op| resolve(*lineno, op))
                    .collect::<Result<Vec<NodeId>, NetlistError>>()?;
            }
        }
    }

    let nodes = kinds
        .into_iter()
        .zip(fanins)
        .map(|((wire, kind), fanin)| (wire, kind, fanin))
        .collect();
    log::debug!(
        "parsed netlist {}: {} inputs, {} outputs, {} gates",
        name,
        inputs.len(),
        outputs.len(),
        gates.len()
    );
    Ok(Circuit::from_parts(
        name.to_string(),
        nodes,
        inputs,
        outputs,
        gates,
    ))
}
