// SPDX-License-Identifier: Apache-2.0

//! Per-gate evaluation rules over `{0, 1, U}`.

use crate::logic::Logic;
use crate::netlist::circuit::GateKind;

fn and_rule(fanin: &[Logic]) -> Logic {
    if fanin.contains(&Logic::Zero) {
        Logic::Zero
    } else if fanin.contains(&Logic::Unknown) {
        Logic::Unknown
    } else {
        Logic::One
    }
}

fn or_rule(fanin: &[Logic]) -> Logic {
    if fanin.contains(&Logic::One) {
        Logic::One
    } else if fanin.contains(&Logic::Unknown) {
        Logic::Unknown
    } else {
        Logic::Zero
    }
}

/// Odd number of ones gives `1`; any `U` gives `U`.
fn parity_rule(fanin: &[Logic]) -> Logic {
    if fanin.contains(&Logic::Unknown) {
        return Logic::Unknown;
    }
    let ones = fanin.iter().filter(|v| **v == Logic::One).count();
    Logic::from(ones % 2 == 1)
}

fn mux_rule(fanin: &[Logic]) -> Logic {
    let pick = |i: usize| fanin.get(i).copied().unwrap_or(Logic::Unknown);
    match pick(2) {
        Logic::Zero => pick(0),
        Logic::One => pick(1),
        Logic::Unknown => Logic::Unknown,
    }
}

/// Transparent register: tracks the data input when it is known, otherwise
/// holds `latched`.
fn dff_rule(fanin: &[Logic], latched: Logic) -> Logic {
    let mut out = latched;
    for value in fanin {
        match value {
            Logic::Zero => out = Logic::Zero,
            Logic::One => {
                out = Logic::One;
                break;
            }
            Logic::Unknown => {}
        }
    }
    out
}

/// Computes the output of a `kind` gate from its fanin values.
///
/// `latched` is only consulted for `DFF`.
///
/// `XNOR` uses the same odd-parity selection as `XOR`, so the two kinds
/// produce identical outputs.
pub fn eval_gate(kind: GateKind, fanin: &[Logic], latched: Logic) -> Logic {
    let first = || fanin.first().copied().unwrap_or(Logic::Unknown);
    match kind {
        GateKind::Buff => first(),
        GateKind::Not => first().not(),
        GateKind::And => and_rule(fanin),
        GateKind::Nand => and_rule(fanin).not(),
        GateKind::Or => or_rule(fanin),
        GateKind::Nor => or_rule(fanin).not(),
        GateKind::Xor | GateKind::Xnor => parity_rule(fanin),
        GateKind::Mux => mux_rule(fanin),
        GateKind::Dff => dff_rule(fanin, latched),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use Logic::{One as I, Unknown as U, Zero as O};

    fn eval(kind: GateKind, fanin: &[Logic]) -> Logic {
        eval_gate(kind, fanin, U)
    }

    #[test_case(GateKind::And, [O, O, O, I]; "and")]
    #[test_case(GateKind::Nand, [I, I, I, O]; "nand")]
    #[test_case(GateKind::Or, [O, I, I, I]; "or")]
    #[test_case(GateKind::Nor, [I, O, O, O]; "nor")]
    #[test_case(GateKind::Xor, [O, I, I, O]; "xor")]
    #[test_case(GateKind::Xnor, [O, I, I, O]; "xnor shares xor parity")]
    fn test_two_input_truth_table(kind: GateKind, expected: [Logic; 4]) {
        let rows = [[O, O], [O, I], [I, O], [I, I]];
        for (row, want) in rows.iter().zip(expected) {
            assert_eq!(eval(kind, row), want, "{} {:?}", kind, row);
        }
    }

    #[test]
    fn test_buff_and_not() {
        assert_eq!(eval(GateKind::Buff, &[O]), O);
        assert_eq!(eval(GateKind::Buff, &[I]), I);
        assert_eq!(eval(GateKind::Buff, &[U]), U);
        assert_eq!(eval(GateKind::Not, &[O]), I);
        assert_eq!(eval(GateKind::Not, &[I]), O);
        assert_eq!(eval(GateKind::Not, &[U]), U);
    }

    #[test_case(GateKind::And, &[U, O], O; "and zero dominates unknown")]
    #[test_case(GateKind::And, &[U, I], U; "and unknown without zero")]
    #[test_case(GateKind::Nand, &[U, O], I; "nand zero dominates unknown")]
    #[test_case(GateKind::Nand, &[I, U], U; "nand unknown without zero")]
    #[test_case(GateKind::Or, &[U, I], I; "or one dominates unknown")]
    #[test_case(GateKind::Or, &[O, U], U; "or unknown without one")]
    #[test_case(GateKind::Nor, &[I, U], O; "nor one dominates unknown")]
    #[test_case(GateKind::Nor, &[U, O], U; "nor unknown without one")]
    #[test_case(GateKind::Xor, &[I, U], U; "xor any unknown")]
    #[test_case(GateKind::Xnor, &[U, O], U; "xnor any unknown")]
    fn test_unknown_handling(kind: GateKind, fanin: &[Logic], expected: Logic) {
        assert_eq!(eval(kind, fanin), expected);
    }

    #[test]
    fn test_all_unknown_fanin_gives_unknown() {
        for kind in [
            GateKind::And,
            GateKind::Nand,
            GateKind::Or,
            GateKind::Nor,
            GateKind::Xor,
            GateKind::Xnor,
        ] {
            assert_eq!(eval(kind, &[U, U, U]), U, "{}", kind);
        }
    }

    #[test]
    fn test_wide_parity() {
        assert_eq!(eval(GateKind::Xor, &[I, I, I]), I);
        assert_eq!(eval(GateKind::Xor, &[I, I, O, O]), O);
        assert_eq!(eval(GateKind::Xnor, &[I, O, O]), I);
    }

    #[test]
    fn test_mux_selects_regardless_of_other_data_line() {
        for other in [O, I, U] {
            assert_eq!(eval(GateKind::Mux, &[I, other, O]), I);
            assert_eq!(eval(GateKind::Mux, &[O, other, O]), O);
            assert_eq!(eval(GateKind::Mux, &[other, I, I]), I);
            assert_eq!(eval(GateKind::Mux, &[other, O, I]), O);
        }
    }

    #[test]
    fn test_mux_unknown_select_has_no_agreement_shortcut() {
        assert_eq!(eval(GateKind::Mux, &[I, I, U]), U);
        assert_eq!(eval(GateKind::Mux, &[O, O, U]), U);
    }

    #[test]
    fn test_dff_tracks_known_data_and_holds_latch_otherwise() {
        assert_eq!(eval_gate(GateKind::Dff, &[O], I), O);
        assert_eq!(eval_gate(GateKind::Dff, &[I], O), I);
        assert_eq!(eval_gate(GateKind::Dff, &[U], I), I);
        assert_eq!(eval_gate(GateKind::Dff, &[U], O), O);
        assert_eq!(eval_gate(GateKind::Dff, &[U], U), U);
    }

    #[test]
    fn test_dff_stops_at_first_one() {
        assert_eq!(eval_gate(GateKind::Dff, &[O, I, O], U), I);
        assert_eq!(eval_gate(GateKind::Dff, &[U, O], I), O);
    }
}
