// SPDX-License-Identifier: Apache-2.0

//! Coverage arithmetic and rendering of fault simulation results.

use std::fmt;
use std::io::Write;

use serde::Serialize;

use crate::fault_sim::{FaultLedger, FaultSimReport, GoldenOutcome, GoldenVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub detected: usize,
    pub total: usize,
}

impl Coverage {
    pub fn of(ledger: &FaultLedger) -> Self {
        Coverage {
            detected: ledger.detected_count(),
            total: ledger.len(),
        }
    }

    /// Whole percent, rounded half to even; `0` for an empty fault list.
    ///
    /// The tie is decided on the exact ratio in integer arithmetic. Rounding
    /// the ratio as a float instead can land on the other side of a tie
    /// that is not exactly representable: `23/40` is `58%` here, while a
    /// float `format(23 / 40, ".0%")` gives `57%`.
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        let scaled = self.detected * 100;
        let quotient = scaled / self.total;
        let twice_rem = 2 * (scaled % self.total);
        if twice_rem > self.total || (twice_rem == self.total && quotient % 2 == 1) {
            quotient + 1
        } else {
            quotient
        }
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} = {}%", self.detected, self.total, self.percent())
    }
}

/// Names of the inputs a report was produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub netlist: String,
    pub vectors: String,
    pub faults: String,
}

/// `tv<N> = <vector> -> <response>` without the `(good)` suffix.
pub fn golden_line(golden: &GoldenVector) -> String {
    let response = match &golden.outcome {
        GoldenOutcome::Rejected(e) => e.annotation().to_string(),
        GoldenOutcome::Simulated { good, .. } => good.to_string(),
    };
    format!("tv{} = {} -> {}", golden.number, golden.vector, response)
}

/// Writes the textual fault simulation report.
pub fn write_report<W: Write>(
    out: &mut W,
    header: &ReportHeader,
    report: &FaultSimReport,
    ledger: &FaultLedger,
) -> std::io::Result<()> {
    writeln!(out, "# fault sim result")?;
    writeln!(out, "# input: {}", header.netlist)?;
    writeln!(out, "# input: {}", header.vectors)?;
    writeln!(out, "# input: {}", header.faults)?;
    writeln!(out)?;
    writeln!(out)?;

    for vector in &report.vectors {
        if let GoldenOutcome::Rejected(_) = vector.golden.outcome {
            writeln!(out, "{}", golden_line(&vector.golden))?;
            continue;
        }
        writeln!(out, "{} (good)", golden_line(&vector.golden))?;
        writeln!(out, "detected:")?;
        for detection in &vector.detections {
            let fault = &ledger.entries()[detection.fault_index].fault;
            writeln!(
                out,
                "{}: {} -> {}",
                fault, vector.golden.vector, detection.faulty
            )?;
        }
        writeln!(out)?;
    }

    let coverage = Coverage::of(ledger);
    writeln!(out, "total detected faults: {}", coverage.detected)?;
    writeln!(out)?;
    writeln!(
        out,
        "undetected faults: {}",
        coverage.total - coverage.detected
    )?;
    for fault in ledger.undetected() {
        writeln!(out, "{}", fault)?;
    }
    writeln!(out)?;
    writeln!(out, "fault coverage: {}", coverage)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorSummary {
    pub number: usize,
    pub vector: String,
    /// Fault-free response; absent when the vector was rejected.
    pub good: Option<String>,
    pub error: Option<String>,
    pub detected: Vec<String>,
}

/// Machine-readable counterpart of [`write_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultSimSummary {
    pub netlist: String,
    pub vectors: Vec<VectorSummary>,
    pub detected: Vec<String>,
    pub undetected: Vec<String>,
    pub coverage: Coverage,
    pub coverage_percent: usize,
}

impl FaultSimSummary {
    pub fn new(netlist: &str, report: &FaultSimReport, ledger: &FaultLedger) -> Self {
        let vectors = report
            .vectors
            .iter()
            .map(|v| {
                let (good, error) = match &v.golden.outcome {
                    GoldenOutcome::Simulated { good, .. } => (Some(good.to_string()), None),
                    GoldenOutcome::Rejected(e) => (None, Some(e.to_string())),
                };
                VectorSummary {
                    number: v.golden.number,
                    vector: v.golden.vector.clone(),
                    good,
                    error,
                    detected: v
                        .detections
                        .iter()
                        .map(|d| ledger.entries()[d.fault_index].fault.to_string())
                        .collect(),
                }
            })
            .collect();
        let coverage = Coverage::of(ledger);
        FaultSimSummary {
            netlist: netlist.to_string(),
            vectors,
            detected: ledger
                .entries()
                .iter()
                .filter(|e| e.detected)
                .map(|e| e.fault.to_string())
                .collect(),
            undetected: ledger.undetected().map(|f| f.to_string()).collect(),
            coverage,
            coverage_percent: coverage.percent(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
