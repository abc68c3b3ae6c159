// SPDX-License-Identifier: Apache-2.0

//! Worklist scheduler that drives a circuit to a fixed point for one input
//! vector.
//!
//! Gates are evaluated in queue order rather than a precomputed topological
//! order: a gate whose fanin is not yet resolved goes back to the tail of
//! the queue. Registers are always ready (they fall back to their latched
//! state), which is what breaks feedback through a `DFF`.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use ahash::AHashMap;

use crate::gate_eval::eval_gate;
use crate::logic::Logic;
use crate::netlist::circuit::{Circuit, NodeId, NodeKind};

/// What a `DFF` remembers between engine invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterPolicy {
    /// Every run starts with all latches at `U`.
    #[default]
    ResetPerVector,
    /// Each run starts from the register values left by the previous run.
    Persistent,
}

impl FromStr for RegisterPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reset-per-vector" => Ok(Self::ResetPerVector),
            "persistent" => Ok(Self::Persistent),
            _ => Err(format!("invalid register policy: {}", s)),
        }
    }
}

impl fmt::Display for RegisterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterPolicy::ResetPerVector => write!(f, "reset-per-vector"),
            RegisterPolicy::Persistent => write!(f, "persistent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimOptions {
    pub register_policy: RegisterPolicy,
    /// Upper bound on queue pops for one run; `None` relies on stall
    /// detection alone.
    pub max_steps: Option<usize>,
}

/// Latched register state, keyed by `DFF` node.
#[derive(Debug, Clone, Default)]
pub struct Latches {
    state: AHashMap<NodeId, Logic>,
}

impl Latches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Logic {
        self.state.get(&id).copied().unwrap_or(Logic::Unknown)
    }

    fn begin_run(&mut self, policy: RegisterPolicy) {
        if policy == RegisterPolicy::ResetPerVector {
            self.state.clear();
        }
    }

    fn capture(&mut self, circuit: &Circuit, policy: RegisterPolicy) {
        if policy != RegisterPolicy::Persistent {
            return;
        }
        for id in circuit.gates() {
            let node = circuit.node(*id);
            if node.is_register() && node.resolved {
                self.state.insert(*id, node.value);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The gate type has no evaluation rule.
    UnsupportedGate { node: String, type_name: String },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnsupportedGate { node, type_name } => write!(
                f,
                "gate \"{}\" has unsupported type \"{}\"",
                node, type_name
            ),
        }
    }
}

impl std::error::Error for EvalError {}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimStats {
    /// Queue pops performed.
    pub steps: usize,
    /// Gates whose value was computed in this run.
    pub evaluated: usize,
    /// Gates still unresolved when the run stopped.
    pub unresolved: Vec<NodeId>,
}

impl SimStats {
    pub fn converged(&self) -> bool {
        self.unresolved.is_empty()
    }
}

fn fanin_value(circuit: &Circuit, id: NodeId) -> Logic {
    let node = circuit.node(id);
    if node.resolved {
        node.value
    } else {
        Logic::Unknown
    }
}

fn is_ready(circuit: &Circuit, id: NodeId) -> bool {
    let node = circuit.node(id);
    node.is_register() || node.fanin.iter().all(|f| circuit.node(*f).resolved)
}

fn evaluate(circuit: &Circuit, id: NodeId, latches: &Latches) -> Result<Logic, EvalError> {
    let node = circuit.node(id);
    match &node.kind {
        NodeKind::Gate(kind) => {
            let fanin: Vec<Logic> = node
                .fanin
                .iter()
                .map(|f| fanin_value(circuit, *f))
                .collect();
            Ok(eval_gate(*kind, &fanin, latches.get(id)))
        }
        NodeKind::Opaque(type_name) => Err(EvalError::UnsupportedGate {
            node: node.name.to_string(),
            type_name: type_name.clone(),
        }),
        NodeKind::PrimaryInput | NodeKind::Tie(_) => Ok(node.value),
    }
}

/// Resolves every gate of `circuit` whose fanin can be resolved.
///
/// Primary inputs must already be bound (see [`crate::vector::apply_vector`]).
/// Nodes that are already resolved, such as wires pinned by a stuck-at
/// fault, are never recomputed.
///
/// The run stops early when a full pass over the queue makes no progress,
/// which only happens for a combinational cycle with no register in it; the
/// nodes left over are reported in [`SimStats::unresolved`].
pub fn simulate(
    circuit: &mut Circuit,
    latches: &mut Latches,
    options: &SimOptions,
) -> Result<SimStats, EvalError> {
    latches.begin_run(options.register_policy);

    let mut queue: VecDeque<NodeId> = circuit.gates().iter().copied().collect();
    let mut stats = SimStats::default();
    // Consecutive pops that re-enqueued without resolving anything.
    let mut idle = 0usize;

    while let Some(id) = queue.pop_front() {
        stats.steps += 1;
        if let Some(max_steps) = options.max_steps {
            if stats.steps > max_steps {
                queue.push_front(id);
                log::warn!(
                    "circuit {}: stopping after {} steps with {} gate(s) pending",
                    circuit.name,
                    max_steps,
                    queue.len()
                );
                break;
            }
        }

        if circuit.node(id).resolved {
            idle = 0;
            continue;
        }

        if !is_ready(circuit, id) {
            queue.push_back(id);
            idle += 1;
            if idle >= queue.len() {
                log::warn!(
                    "circuit {}: {} gate(s) can never become ready, e.g. \"{}\"",
                    circuit.name,
                    queue.len(),
                    circuit.name_of(id)
                );
                break;
            }
            continue;
        }

        let value = evaluate(circuit, id, latches)?;
        log::trace!("{} = {}", circuit.name_of(id), value);
        circuit.force(id, value);
        stats.evaluated += 1;
        idle = 0;
    }

    stats.unresolved = queue
        .into_iter()
        .filter(|id| !circuit.node(*id).resolved)
        .collect();
    latches.capture(circuit, options.register_policy);
    Ok(stats)
}

/// Observed primary-output response for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputVector {
    /// One value per declared output, in declaration order.
    Bits(Vec<Logic>),
    /// The named output never became resolved.
    NotAccessed(String),
}

impl OutputVector {
    /// Reads the declared outputs of a simulated circuit.
    pub fn read(circuit: &Circuit) -> OutputVector {
        let mut bits = Vec::with_capacity(circuit.outputs().len());
        for id in circuit.outputs() {
            let node = circuit.node(*id);
            if !node.resolved {
                return OutputVector::NotAccessed(node.name.to_string());
            }
            bits.push(node.value);
        }
        OutputVector::Bits(bits)
    }
}

impl fmt::Display for OutputVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputVector::Bits(bits) => {
                for bit in bits {
                    write!(f, "{}", bit)?;
                }
                Ok(())
            }
            OutputVector::NotAccessed(name) => {
                write!(f, "NETLIST ERROR: OUTPUT LINE \"{}\" NOT ACCESSED", name)
            }
        }
    }
}
