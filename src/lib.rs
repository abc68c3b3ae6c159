// SPDX-License-Identifier: Apache-2.0

//! Three-valued gate-level single stuck-at fault simulation.
//!
//! The pieces, leaf first:
//!
//! - [`netlist`] loads a `.bench`-style netlist into an index-based
//!   [`netlist::circuit::Circuit`].
//! - [`gate_eval`] holds the per-gate rules over `{0, 1, U}`.
//! - [`gate_sim`] drives a circuit to a fixed point with a worklist.
//! - [`vector`] binds input bit-strings to primary inputs.
//! - [`fault`] describes stuck-at faults and enumerates the fault universe.
//! - [`fault_sim`] injects faults into clones of the circuit and compares
//!   against the fault-free response.
//! - [`coverage`] folds detections into the final report.

pub mod coverage;
pub mod fault;
pub mod fault_sim;
pub mod gate_eval;
pub mod gate_sim;
pub mod logic;
pub mod netlist;
pub mod test_utils;
pub mod vector;
