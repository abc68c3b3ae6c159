// SPDX-License-Identifier: Apache-2.0

//! Arena-backed circuit graph.
//!
//! Nodes refer to each other by [`NodeId`], so a register may name a node
//! that is downstream of it without creating an ownership cycle.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ahash::AHashMap;

use crate::logic::Logic;

/// Index into `Circuit::nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GateKind {
    Buff,
    Not,
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
    Mux,
    Dff,
}

impl GateKind {
    pub const ALL: [GateKind; 10] = [
        GateKind::Buff,
        GateKind::Not,
        GateKind::And,
        GateKind::Nand,
        GateKind::Or,
        GateKind::Nor,
        GateKind::Xor,
        GateKind::Xnor,
        GateKind::Mux,
        GateKind::Dff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GateKind::Buff => "BUFF",
            GateKind::Not => "NOT",
            GateKind::And => "AND",
            GateKind::Nand => "NAND",
            GateKind::Or => "OR",
            GateKind::Nor => "NOR",
            GateKind::Xor => "XOR",
            GateKind::Xnor => "XNOR",
            GateKind::Mux => "MUX",
            GateKind::Dff => "DFF",
        }
    }

    /// Returns `(min, max)` fanin counts accepted by the loader.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            GateKind::Buff | GateKind::Not => (1, Some(1)),
            GateKind::Mux => (3, Some(3)),
            _ => (1, None),
        }
    }

    pub fn is_register(self) -> bool {
        self == GateKind::Dff
    }
}

impl FromStr for GateKind {
    type Err = String;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        GateKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == upper)
            .ok_or_else(|| format!("unknown gate type: {}", s))
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    PrimaryInput,
    Gate(GateKind),
    /// Gate whose type name has no evaluation rule; evaluating it fails.
    Opaque(String),
    /// Constant driver synthesized by input stuck-at fault injection.
    Tie(Logic),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: Arc<str>,
    pub kind: NodeKind,
    /// Ordered; `MUX` fanin is `{dataA, dataB, select}`.
    pub fanin: Vec<NodeId>,
    pub resolved: bool,
    pub value: Logic,
}

impl Node {
    fn new(name: Arc<str>, kind: NodeKind, fanin: Vec<NodeId>) -> Self {
        let mut node = Node {
            name,
            kind,
            fanin,
            resolved: false,
            value: Logic::Unknown,
        };
        node.reset();
        node
    }

    fn reset(&mut self) {
        match self.kind {
            NodeKind::Tie(value) => {
                self.resolved = true;
                self.value = value;
            }
            _ => {
                self.resolved = false;
                self.value = Logic::Unknown;
            }
        }
    }

    pub fn is_register(&self) -> bool {
        matches!(self.kind, NodeKind::Gate(GateKind::Dff))
    }
}

/// Counts reported after loading a netlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitStats {
    pub inputs: usize,
    pub outputs: usize,
    pub gates: usize,
    pub gate_counts: BTreeMap<String, usize>,
}

/// Owns every node of a netlist plus the ordered port and gate lists.
///
/// Cloning is a structural copy: nodes are duplicated, the name index is
/// shared. Fault injection relies on this to mutate a clone without
/// touching the fault-free circuit.
#[derive(Debug, Clone)]
pub struct Circuit {
    pub name: String,
    nodes: Vec<Node>,
    by_name: Arc<AHashMap<Arc<str>, NodeId>>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    gates: Vec<NodeId>,
}

impl Circuit {
    /// Assembles a circuit from already-validated parts; used by the loader.
    pub(crate) fn from_parts(
        name: String,
        nodes: Vec<(Arc<str>, NodeKind, Vec<NodeId>)>,
        inputs: Vec<NodeId>,
        outputs: Vec<NodeId>,
        gates: Vec<NodeId>,
    ) -> Self {
        let mut by_name = AHashMap::with_capacity(nodes.len());
        let nodes: Vec<Node> = nodes
            .into_iter()
            .enumerate()
            .map(|(i, (name, kind, fanin))| {
                by_name.insert(name.clone(), NodeId(i));
                Node::new(name, kind, fanin)
            })
            .collect();
        Circuit {
            name,
            nodes,
            by_name: Arc::new(by_name),
            inputs,
            outputs,
            gates,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Primary inputs in declaration order; this is the vector bit order.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Declared primary outputs; may alias any node, inputs included.
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Gate outputs in netlist order, not sorted by dependency.
    pub fn gates(&self) -> &[NodeId] {
        &self.gates
    }

    pub fn input_width(&self) -> usize {
        self.inputs.len()
    }

    /// Clears all per-vector state: every wire back to unresolved `U`.
    ///
    /// Synthesized tie nodes keep their constant.
    pub fn reset(&mut self) {
        for node in self.nodes.iter_mut() {
            node.reset();
        }
    }

    /// Pins `id` to `value` so the scheduler never recomputes it.
    pub fn force(&mut self, id: NodeId, value: Logic) {
        let node = &mut self.nodes[id.0];
        node.resolved = true;
        node.value = value;
    }

    /// Appends a permanently-resolved constant node and returns its id.
    ///
    /// The node is not entered into the name index, so it can never be the
    /// target of a later lookup.
    pub fn add_tie(&mut self, name: Arc<str>, value: Logic) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name, NodeKind::Tie(value), Vec::new()));
        id
    }

    /// Redirects every fanin slot of `gate` that reads `from` to read `to`.
    /// Returns how many slots were rewired.
    pub fn rewire_fanin(&mut self, gate: NodeId, from: NodeId, to: NodeId) -> usize {
        let mut count = 0;
        for slot in self.nodes[gate.0].fanin.iter_mut() {
            if *slot == from {
                *slot = to;
                count += 1;
            }
        }
        count
    }

    pub fn stats(&self) -> CircuitStats {
        let mut gate_counts: BTreeMap<String, usize> = BTreeMap::new();
        for id in &self.gates {
            let type_name = match &self.nodes[id.0].kind {
                NodeKind::Gate(kind) => kind.name().to_string(),
                NodeKind::Opaque(type_name) => type_name.clone(),
                NodeKind::PrimaryInput | NodeKind::Tie(_) => continue,
            };
            *gate_counts.entry(type_name).or_insert(0) += 1;
        }
        CircuitStats {
            inputs: self.inputs.len(),
            outputs: self.outputs.len(),
            gates: self.gates.len(),
            gate_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::parse::parse_netlist_str;
    use crate::test_utils::AND2_BENCH;

    #[test]
    fn test_gate_kind_parse_is_case_insensitive() {
        assert_eq!("nand".parse::<GateKind>(), Ok(GateKind::Nand));
        assert_eq!("Xnor".parse::<GateKind>(), Ok(GateKind::Xnor));
        assert!("LATCH".parse::<GateKind>().is_err());
    }

    #[test]
    fn test_reset_clears_forced_values() {
        let mut circuit = parse_netlist_str("and2", AND2_BENCH).unwrap();
        let z = circuit.lookup("z").unwrap();
        circuit.force(z, Logic::One);
        assert!(circuit.node(z).resolved);
        circuit.reset();
        assert!(!circuit.node(z).resolved);
        assert_eq!(circuit.node(z).value, Logic::Unknown);
    }

    #[test]
    fn test_clone_is_independent_of_original() {
        let golden = parse_netlist_str("and2", AND2_BENCH).unwrap();
        let mut faulty = golden.clone();
        let a = faulty.lookup("A").unwrap();
        let z = faulty.lookup("z").unwrap();
        let tie = faulty.add_tie("z-IN-A".into(), Logic::Zero);
        assert_eq!(faulty.rewire_fanin(z, a, tie), 1);
        assert_eq!(golden.node(z).fanin, vec![a, golden.lookup("B").unwrap()]);
        assert_eq!(golden.nodes().len() + 1, faulty.nodes().len());
        // Ties survive a reset with their constant intact.
        faulty.reset();
        assert!(faulty.node(tie).resolved);
        assert_eq!(faulty.node(tie).value, Logic::Zero);
        assert_eq!(faulty.lookup("z-IN-A"), None);
    }

    #[test]
    fn test_stats_counts_gate_kinds() {
        let circuit = parse_netlist_str("c17", crate::test_utils::C17_BENCH).unwrap();
        let stats = circuit.stats();
        assert_eq!(stats.inputs, 5);
        assert_eq!(stats.outputs, 2);
        assert_eq!(stats.gates, 6);
        assert_eq!(stats.gate_counts.get("NAND"), Some(&6));
    }
}
