// SPDX-License-Identifier: Apache-2.0

//! Fault injection and detection.
//!
//! The fault-free ("golden") response is computed once per vector. Each
//! fault is then simulated on its own clone of the circuit for every
//! accepted vector, and counts as detected by a vector when the faulty
//! output differs from the golden one. Faults never share mutable state,
//! so they are spread across worker threads.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::fault::{Fault, FaultSite};
use crate::gate_sim::{simulate, EvalError, Latches, OutputVector, SimOptions};
use crate::logic::Logic;
use crate::netlist::circuit::{Circuit, NodeId};
use crate::vector::{bind_inputs, decode_vector, InputVector, VectorError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ParallelismStrategy {
    SingleThreaded,
    /// One fault at a time per worker; workers pull the next fault index.
    #[default]
    FaultParallel,
}

impl FromStr for ParallelismStrategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single-threaded" => Ok(Self::SingleThreaded),
            "fault-parallel" => Ok(Self::FaultParallel),
            _ => Err(format!("invalid parallelism strategy: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FaultSimOptions {
    pub sim: SimOptions,
    pub parallelism: ParallelismStrategy,
    /// Worker count for [`ParallelismStrategy::FaultParallel`]; defaults to
    /// the number of CPUs.
    pub threads: Option<usize>,
}

/// A fault that cannot be applied to the circuit at hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultError {
    UnknownWire {
        fault: String,
        wire: String,
    },
    /// The named driver does not feed the named gate.
    NotAFanin {
        fault: String,
        gate: String,
        driver: String,
    },
}

impl fmt::Display for FaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultError::UnknownWire { fault, wire } => {
                write!(f, "fault {}: no wire named \"{}\"", fault, wire)
            }
            FaultError::NotAFanin {
                fault,
                gate,
                driver,
            } => write!(
                f,
                "fault {}: \"{}\" is not an input of gate \"{}\"",
                fault, driver, gate
            ),
        }
    }
}

impl std::error::Error for FaultError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultSimError {
    Fault(FaultError),
    Eval {
        /// `None` for the fault-free run.
        fault: Option<String>,
        vector: String,
        source: EvalError,
    },
}

impl fmt::Display for FaultSimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultSimError::Fault(e) => write!(f, "{}", e),
            FaultSimError::Eval {
                fault,
                vector,
                source,
            } => match fault {
                Some(fault) => write!(f, "fault {} on vector {}: {}", fault, vector, source),
                None => write!(f, "vector {}: {}", vector, source),
            },
        }
    }
}

impl std::error::Error for FaultSimError {}

impl From<FaultError> for FaultSimError {
    fn from(e: FaultError) -> Self {
        FaultSimError::Fault(e)
    }
}

/// A fault and whether any vector has detected it so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultEntry {
    pub fault: Fault,
    pub detected: bool,
}

/// Detection flags for a fault list. Flags only ever go from `false` to
/// `true`.
#[derive(Debug, Clone, Default)]
pub struct FaultLedger {
    entries: Vec<FaultEntry>,
}

impl FaultLedger {
    pub fn new(faults: Vec<Fault>) -> Self {
        FaultLedger {
            entries: faults
                .into_iter()
                .map(|fault| FaultEntry {
                    fault,
                    detected: false,
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[FaultEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flags fault `index` as detected; returns whether it was newly flagged.
    pub fn mark_detected(&mut self, index: usize) -> bool {
        let entry = &mut self.entries[index];
        let newly = !entry.detected;
        entry.detected = true;
        newly
    }

    pub fn detected_count(&self) -> usize {
        self.entries.iter().filter(|e| e.detected).count()
    }

    pub fn undetected(&self) -> impl Iterator<Item = &Fault> {
        self.entries
            .iter()
            .filter(|e| !e.detected)
            .map(|e| &e.fault)
    }
}

fn lookup(circuit: &Circuit, fault: &Fault, wire: &str) -> Result<NodeId, FaultError> {
    circuit.lookup(wire).ok_or_else(|| FaultError::UnknownWire {
        fault: fault.to_string(),
        wire: wire.to_string(),
    })
}

/// Checks that `fault` names wires (and, for a pin fault, an edge) that
/// exist in `circuit`.
pub fn check_fault(circuit: &Circuit, fault: &Fault) -> Result<(), FaultError> {
    match &fault.site {
        FaultSite::Wire(wire) => lookup(circuit, fault, wire).map(|_| ()),
        FaultSite::Pin { gate, driver } => {
            let gate_id = lookup(circuit, fault, gate)?;
            let driver_id = lookup(circuit, fault, driver)?;
            if circuit.node(gate_id).fanin.contains(&driver_id) {
                Ok(())
            } else {
                Err(FaultError::NotAFanin {
                    fault: fault.to_string(),
                    gate: gate.clone(),
                    driver: driver.clone(),
                })
            }
        }
    }
}

/// Applies `fault` to a circuit whose inputs are already bound.
///
/// A wire fault pins the wire so the scheduler never recomputes it. A pin
/// fault adds a constant node and points the gate's fanin slot(s) for the
/// driver at it, leaving every other load of the driver untouched.
pub fn inject_fault(circuit: &mut Circuit, fault: &Fault) -> Result<(), FaultError> {
    let value: Logic = fault.stuck_value();
    match &fault.site {
        FaultSite::Wire(wire) => {
            let id = lookup(circuit, fault, wire)?;
            circuit.force(id, value);
        }
        FaultSite::Pin { gate, driver } => {
            check_fault(circuit, fault)?;
            let gate_id = lookup(circuit, fault, gate)?;
            let driver_id = lookup(circuit, fault, driver)?;
            let tie = circuit.add_tie(fault.to_string().into(), value);
            circuit.rewire_fanin(gate_id, driver_id, tie);
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoldenOutcome {
    /// The vector could not be applied; it takes no further part.
    Rejected(VectorError),
    Simulated {
        inputs: Vec<Logic>,
        good: OutputVector,
    },
}

/// Fault-free response to one vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldenVector {
    /// 1-based position in the vector sequence.
    pub number: usize,
    pub vector: String,
    pub outcome: GoldenOutcome,
}

/// Simulates each vector on the fault-free circuit.
///
/// Every vector starts from a fully reset wire state, so a rejected vector
/// cannot leak into the next one.
pub fn simulate_golden(
    circuit: &Circuit,
    vectors: &[InputVector],
    options: &SimOptions,
) -> Result<Vec<GoldenVector>, FaultSimError> {
    let mut working = circuit.clone();
    let mut latches = Latches::new();
    let mut golden = Vec::with_capacity(vectors.len());
    for (i, vector) in vectors.iter().enumerate() {
        working.reset();
        let outcome = match decode_vector(working.input_width(), &vector.text) {
            Err(e) => {
                log::warn!("vector {} (line {}): {}", vector.text, vector.lineno, e);
                GoldenOutcome::Rejected(e)
            }
            Ok(inputs) => {
                bind_inputs(&mut working, &inputs);
                simulate(&mut working, &mut latches, options).map_err(|source| {
                    FaultSimError::Eval {
                        fault: None,
                        vector: vector.text.clone(),
                        source,
                    }
                })?;
                GoldenOutcome::Simulated {
                    inputs,
                    good: OutputVector::read(&working),
                }
            }
        };
        golden.push(GoldenVector {
            number: i + 1,
            vector: vector.text.clone(),
            outcome,
        });
    }
    Ok(golden)
}

/// A fault whose output differed from the golden output on some vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub fault_index: usize,
    pub faulty: OutputVector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorReport {
    pub golden: GoldenVector,
    /// In fault-list order.
    pub detections: Vec<Detection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultSimReport {
    pub vectors: Vec<VectorReport>,
}

/// Runs one fault over every accepted vector; returns `(vector index,
/// faulty output)` for each vector that detects it.
fn simulate_fault(
    circuit: &Circuit,
    fault: &Fault,
    golden: &[GoldenVector],
    options: &SimOptions,
) -> Result<Vec<(usize, OutputVector)>, FaultSimError> {
    let mut latches = Latches::new();
    let mut detections = Vec::new();
    for (i, g) in golden.iter().enumerate() {
        let (inputs, good) = match &g.outcome {
            GoldenOutcome::Simulated { inputs, good } => (inputs, good),
            GoldenOutcome::Rejected(_) => continue,
        };
        let mut faulty = circuit.clone();
        faulty.reset();
        bind_inputs(&mut faulty, inputs);
        inject_fault(&mut faulty, fault)?;
        simulate(&mut faulty, &mut latches, options).map_err(|source| FaultSimError::Eval {
            fault: Some(fault.to_string()),
            vector: g.vector.clone(),
            source,
        })?;
        let observed = OutputVector::read(&faulty);
        if &observed != good {
            log::trace!("{} detected by {}: {}", fault, g.vector, observed);
            detections.push((i, observed));
        }
    }
    Ok(detections)
}

type FaultOutcome = (usize, Result<Vec<(usize, OutputVector)>, FaultSimError>);

fn simulate_faults_parallel(
    circuit: &Circuit,
    faults: &[Fault],
    golden: &[GoldenVector],
    options: &SimOptions,
    thread_cnt: usize,
) -> Vec<FaultOutcome> {
    let next_fault = AtomicUsize::new(0);
    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(thread_cnt);
        for _ in 0..thread_cnt {
            let next_fault = &next_fault;
            handles.push(scope.spawn(move || {
                let mut local: Vec<FaultOutcome> = Vec::new();
                loop {
                    let idx = next_fault.fetch_add(1, Ordering::SeqCst);
                    if idx >= faults.len() {
                        break;
                    }
                    local.push((idx, simulate_fault(circuit, &faults[idx], golden, options)));
                }
                local
            }));
        }
        let mut outcomes = Vec::with_capacity(faults.len());
        for handle in handles {
            match handle.join() {
                Ok(local) => outcomes.extend(local),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        outcomes
    })
}

/// Fault-simulates every vector against every fault in `ledger`.
///
/// Faults are checked against the circuit before anything is simulated.
/// Detection flags in `ledger` are only ever raised, so a ledger can be
/// carried across several calls.
pub fn run_fault_sim(
    circuit: &Circuit,
    vectors: &[InputVector],
    ledger: &mut FaultLedger,
    options: &FaultSimOptions,
) -> Result<FaultSimReport, FaultSimError> {
    for entry in ledger.entries() {
        check_fault(circuit, &entry.fault)?;
    }

    let golden = simulate_golden(circuit, vectors, &options.sim)?;
    let faults: Vec<Fault> = ledger.entries().iter().map(|e| e.fault.clone()).collect();

    let mut outcomes: Vec<FaultOutcome> = match options.parallelism {
        ParallelismStrategy::SingleThreaded => faults
            .iter()
            .enumerate()
            .map(|(i, fault)| (i, simulate_fault(circuit, fault, &golden, &options.sim)))
            .collect(),
        ParallelismStrategy::FaultParallel => {
            let requested = options.threads.unwrap_or_else(num_cpus::get);
            let thread_cnt = std::cmp::max(1, std::cmp::min(requested, faults.len()));
            log::info!(
                "fault simulation: {} faults x {} vectors on {} thread(s)",
                faults.len(),
                golden.len(),
                thread_cnt
            );
            simulate_faults_parallel(circuit, &faults, &golden, &options.sim, thread_cnt)
        }
    };
    outcomes.sort_by_key(|(i, _)| *i);

    let mut reports: Vec<VectorReport> = golden
        .into_iter()
        .map(|golden| VectorReport {
            golden,
            detections: Vec::new(),
        })
        .collect();
    for (fault_index, outcome) in outcomes {
        let detections = outcome?;
        if !detections.is_empty() {
            ledger.mark_detected(fault_index);
        }
        for (vector_index, faulty) in detections {
            reports[vector_index].detections.push(Detection {
                fault_index,
                faulty,
            });
        }
    }
    log::info!(
        "fault simulation: {}/{} faults detected",
        ledger.detected_count(),
        ledger.len()
    );
    Ok(FaultSimReport { vectors: reports })
}
