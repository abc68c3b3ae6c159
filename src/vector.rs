// SPDX-License-Identifier: Apache-2.0

//! Binding input bit-strings to primary inputs.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::logic::Logic;
use crate::netlist::circuit::Circuit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorError {
    /// The vector is shorter than the circuit's input width.
    InsufficientBits { expected: usize, actual: usize },
    /// A retained character is not one of `0`, `1`, `U`, `u`.
    InvalidInputValue { position: usize, found: char },
}

impl VectorError {
    /// Annotation written into the fault simulation report.
    pub fn annotation(&self) -> &'static str {
        match self {
            VectorError::InsufficientBits { .. } => "INPUT ERROR: INSUFFICIENT BITS",
            VectorError::InvalidInputValue { .. } => "INPUT ERROR: INVALID INPUT VALUE/S",
        }
    }
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorError::InsufficientBits { expected, actual } => write!(
                f,
                "{} (need {}, got {})",
                self.annotation(),
                expected,
                actual
            ),
            VectorError::InvalidInputValue { position, found } => write!(
                f,
                "{} ('{}' at position {})",
                self.annotation(),
                found,
                position
            ),
        }
    }
}

impl std::error::Error for VectorError {}

/// One line of a vector file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputVector {
    pub lineno: u32,
    /// The line with all whitespace removed.
    pub text: String,
}

/// Splits vector-file text into vectors, skipping blank lines and `#`
/// comments.
pub fn parse_vectors(text: &str) -> Vec<InputVector> {
    let mut vectors = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        if raw.trim_start().starts_with('#') {
            continue;
        }
        let line: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if line.is_empty() {
            continue;
        }
        vectors.push(InputVector {
            lineno: (i + 1) as u32,
            text: line,
        });
    }
    vectors
}

/// Decodes the last `width` characters of `bits` into input values.
///
/// Extra leading characters are discarded without being checked.
pub fn decode_vector(width: usize, bits: &str) -> Result<Vec<Logic>, VectorError> {
    let chars: Vec<char> = bits.chars().collect();
    if chars.len() < width {
        return Err(VectorError::InsufficientBits {
            expected: width,
            actual: chars.len(),
        });
    }
    let skipped = chars.len() - width;
    chars[skipped..]
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Logic::from_char(*c).ok_or(VectorError::InvalidInputValue {
                position: skipped + i,
                found: *c,
            })
        })
        .collect()
}

/// Marks each primary input resolved with the matching value, first value
/// to first declared input.
pub fn bind_inputs(circuit: &mut Circuit, values: &[Logic]) {
    assert_eq!(values.len(), circuit.input_width());
    let inputs = circuit.inputs().to_vec();
    for (id, value) in inputs.into_iter().zip(values) {
        circuit.force(id, *value);
    }
}

/// Binds `bits` to the primary inputs of `circuit`.
///
/// Only the last `input_width` characters are used; the first of those
/// drives the first declared input. Nothing is written unless the whole
/// retained slice is valid. Callers reset the circuit beforehand.
pub fn apply_vector(circuit: &mut Circuit, bits: &str) -> Result<(), VectorError> {
    let values = decode_vector(circuit.input_width(), bits)?;
    bind_inputs(circuit, &values);
    Ok(())
}

/// Produces `count` random `{0,1}` vectors sized for `circuit`.
///
/// The stream is fully determined by `seed`.
pub fn random_vectors(circuit: &Circuit, count: usize, seed: u64) -> Vec<String> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let width = circuit.input_width();
    (0..count)
        .map(|_| {
            (0..width)
                .map(|_| if rng.gen_bool(0.5) { '1' } else { '0' })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::parse::parse_netlist_str;
    use crate::test_utils::{AND2_BENCH, C17_BENCH};
    use pretty_assertions::assert_eq;

    fn values(circuit: &Circuit) -> Vec<(String, bool, Logic)> {
        circuit
            .nodes()
            .iter()
            .map(|n| (n.name.to_string(), n.resolved, n.value))
            .collect()
    }

    #[test]
    fn test_first_char_drives_first_declared_input() {
        let mut circuit = parse_netlist_str("and2", AND2_BENCH).unwrap();
        apply_vector(&mut circuit, "01").unwrap();
        assert_eq!(
            values(&circuit),
            vec![
                ("A".to_string(), true, Logic::Zero),
                ("B".to_string(), true, Logic::One),
                ("z".to_string(), false, Logic::Unknown),
            ]
        );
    }

    #[test]
    fn test_longer_vector_keeps_trailing_bits() {
        let mut circuit = parse_netlist_str("and2", AND2_BENCH).unwrap();
        apply_vector(&mut circuit, "xx0u").unwrap();
        let a = circuit.lookup("A").unwrap();
        let b = circuit.lookup("B").unwrap();
        assert_eq!(circuit.node(a).value, Logic::Zero);
        assert_eq!(circuit.node(b).value, Logic::Unknown);
    }

    #[test]
    fn test_short_vector_is_rejected() {
        let mut circuit = parse_netlist_str("c17", C17_BENCH).unwrap();
        let err = apply_vector(&mut circuit, "0101").unwrap_err();
        assert_eq!(
            err,
            VectorError::InsufficientBits {
                expected: 5,
                actual: 4
            }
        );
        assert_eq!(err.annotation(), "INPUT ERROR: INSUFFICIENT BITS");
    }

    #[test]
    fn test_invalid_character_binds_nothing() {
        let mut circuit = parse_netlist_str("and2", AND2_BENCH).unwrap();
        let before = values(&circuit);
        let err = apply_vector(&mut circuit, "1x").unwrap_err();
        assert_eq!(
            err,
            VectorError::InvalidInputValue {
                position: 1,
                found: 'x'
            }
        );
        assert_eq!(err.annotation(), "INPUT ERROR: INVALID INPUT VALUE/S");
        assert_eq!(values(&circuit), before);
    }

    #[test]
    fn test_parse_vectors_skips_comments_and_blanks() {
        let text = "# vectors\n\n1 1\n01\n  # indented comment\nU0\n";
        let vectors = parse_vectors(text);
        assert_eq!(
            vectors,
            vec![
                InputVector {
                    lineno: 3,
                    text: "11".to_string()
                },
                InputVector {
                    lineno: 4,
                    text: "01".to_string()
                },
                InputVector {
                    lineno: 6,
                    text: "U0".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_random_vectors_are_seeded() {
        let circuit = parse_netlist_str("c17", C17_BENCH).unwrap();
        let first = random_vectors(&circuit, 8, 42);
        assert_eq!(first, random_vectors(&circuit, 8, 42));
        assert_eq!(first.len(), 8);
        for v in &first {
            assert_eq!(v.len(), 5);
            assert!(v.chars().all(|c| c == '0' || c == '1'));
        }
    }
}
