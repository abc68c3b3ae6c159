// SPDX-License-Identifier: Apache-2.0

//! Single stuck-at fault descriptors and the full fault universe.
//!
//! Text syntax, one fault per line:
//!
//! ```text
//! <wire>-SA-<0|1>
//! <gate>-IN-<driver>-SA-<0|1>
//! ```

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::logic::Logic;
use crate::netlist::circuit::Circuit;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FaultSite {
    /// The wire at its driver; every load sees the stuck value.
    Wire(String),
    /// Only the fanin pin of `gate` that is fed by `driver`.
    Pin { gate: String, driver: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fault {
    pub site: FaultSite,
    pub stuck_at: bool,
}

impl Fault {
    pub fn wire(wire: &str, stuck_at: bool) -> Self {
        Fault {
            site: FaultSite::Wire(wire.to_string()),
            stuck_at,
        }
    }

    pub fn pin(gate: &str, driver: &str, stuck_at: bool) -> Self {
        Fault {
            site: FaultSite::Pin {
                gate: gate.to_string(),
                driver: driver.to_string(),
            },
            stuck_at,
        }
    }

    pub fn stuck_value(&self) -> Logic {
        Logic::from(self.stuck_at)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = u8::from(self.stuck_at);
        match &self.site {
            FaultSite::Wire(wire) => write!(f, "{}-SA-{}", wire, v),
            FaultSite::Pin { gate, driver } => write!(f, "{}-IN-{}-SA-{}", gate, driver, v),
        }
    }
}

/// `s` without `suffix`, compared ASCII case-insensitively.
fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let at = s.len().checked_sub(suffix.len())?;
    match s.get(at..) {
        Some(tail) if tail.eq_ignore_ascii_case(suffix) => Some(&s[..at]),
        _ => None,
    }
}

fn parse_polarity(s: &str) -> Result<bool, String> {
    match s {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(format!("stuck-at value must be 0 or 1, got \"{}\"", s)),
    }
}

fn malformed(s: &str) -> String {
    format!(
        "expected <wire>-SA-<v> or <gate>-IN-<driver>-SA-<v>, got \"{}\"",
        s
    )
}

/// Net names may contain `-`, so the `-SA-<v>` suffix is taken off the
/// right end first and the remainder is split at the first `-IN-`.
impl FromStr for Fault {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((site, polarity)) = s.rsplit_once('-') else {
            return Err(malformed(s));
        };
        let Some(site) = strip_suffix_ignore_case(site, "-SA") else {
            return Err(malformed(s));
        };
        if site.is_empty() || strip_suffix_ignore_case(site, "-IN").is_some() {
            return Err(malformed(s));
        }
        let stuck_at = parse_polarity(polarity)?;

        // ASCII uppercasing keeps byte offsets, so `at` indexes `site` too.
        match site.to_ascii_uppercase().find("-IN-") {
            Some(at) => {
                let (gate, driver) = (&site[..at], &site[at + 4..]);
                if gate.is_empty() || driver.is_empty() {
                    return Err(malformed(s));
                }
                Ok(Fault::pin(gate, driver, stuck_at))
            }
            None => Ok(Fault::wire(site, stuck_at)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultParseError {
    pub lineno: u32,
    pub message: String,
}

impl fmt::Display for FaultParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fault list line {}: {}", self.lineno, self.message)
    }
}

impl std::error::Error for FaultParseError {}

/// Parses fault-list text; blank lines and `#` comments are skipped.
pub fn parse_fault_list(text: &str) -> Result<Vec<Fault>, FaultParseError> {
    let mut faults = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let code = match raw.find('#') {
            Some(at) => &raw[..at],
            None => raw,
        };
        let line: String = code.chars().filter(|c| !c.is_whitespace()).collect();
        if line.is_empty() {
            continue;
        }
        let fault = line.parse::<Fault>().map_err(|message| FaultParseError {
            lineno: (i + 1) as u32,
            message,
        })?;
        faults.push(fault);
    }
    Ok(faults)
}

/// Enumerates every single stuck-at fault of `circuit`.
///
/// Order: both polarities on each primary input, then for each gate both
/// polarities on its output wire followed by both polarities on each of
/// its fanin pins.
pub fn full_fault_list(circuit: &Circuit) -> Vec<Fault> {
    let mut faults = Vec::new();
    for id in circuit.inputs() {
        let wire = circuit.name_of(*id);
        faults.push(Fault::wire(wire, false));
        faults.push(Fault::wire(wire, true));
    }
    for id in circuit.gates() {
        let gate = circuit.name_of(*id);
        faults.push(Fault::wire(gate, false));
        faults.push(Fault::wire(gate, true));
        for fanin in &circuit.node(*id).fanin {
            let driver = circuit.name_of(*fanin);
            faults.push(Fault::pin(gate, driver, false));
            faults.push(Fault::pin(gate, driver, true));
        }
    }
    log::debug!(
        "circuit {}: generated {} faults",
        circuit.name,
        faults.len()
    );
    faults
}

/// Writes `faults` as a fault-list file that [`parse_fault_list`] accepts.
pub fn write_fault_list<W: Write>(
    out: &mut W,
    circuit_name: &str,
    faults: &[Fault],
) -> std::io::Result<()> {
    writeln!(out, "# {}", circuit_name)?;
    writeln!(out, "# full SSA fault list")?;
    writeln!(out)?;
    for fault in faults {
        writeln!(out, "{}", fault)?;
    }
    writeln!(out)?;
    writeln!(out, "# total faults: {}", faults.len())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::parse::parse_netlist_str;
    use crate::test_utils::{AND2_BENCH, C17_BENCH};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_fault_list_and2() {
        let circuit = parse_netlist_str("and2", AND2_BENCH).unwrap();
        let faults: Vec<String> = full_fault_list(&circuit)
            .iter()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(
            faults,
            vec![
                "A-SA-0",
                "A-SA-1",
                "B-SA-0",
                "B-SA-1",
                "z-SA-0",
                "z-SA-1",
                "z-IN-A-SA-0",
                "z-IN-A-SA-1",
                "z-IN-B-SA-0",
                "z-IN-B-SA-1",
            ]
        );
    }

    #[test]
    fn test_full_fault_list_c17_count() {
        let circuit = parse_netlist_str("c17", C17_BENCH).unwrap();
        // 5 inputs * 2 + 6 two-input gates * (2 + 2 * 2).
        assert_eq!(full_fault_list(&circuit).len(), 46);
    }

    #[test]
    fn test_parse_both_forms() {
        assert_eq!("A-SA-0".parse::<Fault>(), Ok(Fault::wire("A", false)));
        assert_eq!(
            "z-IN-B-SA-1".parse::<Fault>(),
            Ok(Fault::pin("z", "B", true))
        );
        assert_eq!("n1-sa-1".parse::<Fault>(), Ok(Fault::wire("n1", true)));
    }

    #[test]
    fn test_parse_rejects_bad_faults() {
        assert!("A-SA-2".parse::<Fault>().is_err());
        assert!("A-SB-0".parse::<Fault>().is_err());
        assert!("A-IN-SA-0".parse::<Fault>().is_err());
        assert!("-SA-0".parse::<Fault>().is_err());
        assert!("A".parse::<Fault>().is_err());
        assert!("IN-B-SA-0".parse::<Fault>().is_ok());
        assert!("-IN-B-SA-0".parse::<Fault>().is_err());
        assert!("z-IN--SA-0".parse::<Fault>().is_err());
    }

    #[test]
    fn test_written_list_parses_back() {
        let circuit = parse_netlist_str("c17", C17_BENCH).unwrap();
        let faults = full_fault_list(&circuit);
        let mut out: Vec<u8> = Vec::new();
        write_fault_list(&mut out, "c17.bench", &faults).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# c17.bench\n# full SSA fault list\n\n1-SA-0\n"));
        assert!(text.ends_with("\n# total faults: 46\n"));
        assert_eq!(parse_fault_list(&text).unwrap(), faults);
    }

    #[test]
    fn test_hyphenated_names_round_trip() {
        let text = "INPUT(a-1)\nINPUT(b)\nOUTPUT(y-out)\ny-out = AND(a-1, b)\n";
        let circuit = parse_netlist_str("hyphen", text).unwrap();
        let faults = full_fault_list(&circuit);
        assert!(faults.contains(&Fault::pin("y-out", "a-1", false)));

        let mut out: Vec<u8> = Vec::new();
        write_fault_list(&mut out, "hyphen.bench", &faults).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\na-1-SA-0\n"));
        assert!(text.contains("\ny-out-IN-a-1-SA-1\n"));
        assert_eq!(parse_fault_list(&text).unwrap(), faults);
    }

    #[test]
    fn test_parse_fault_list_reports_line() {
        let err = parse_fault_list("# header\nA-SA-0\n\nB-XX-1\n").unwrap_err();
        assert_eq!(err.lineno, 4);
        assert!(err.to_string().starts_with("fault list line 4:"));
    }
}
