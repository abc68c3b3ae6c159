// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for reading netlists, vector files and fault lists from
//! disk.
//!
//! Files ending in `.gz` are transparently decompressed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{anyhow, Result};
use flate2::read::MultiGzDecoder;

use crate::fault::{parse_fault_list, Fault};
use crate::netlist::circuit::Circuit;
use crate::netlist::parse::parse_netlist_str;
use crate::vector::{parse_vectors, InputVector};

fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file =
        File::open(path).map_err(|e| anyhow!(format!("opening '{}': {}", path.display(), e)))?;
    let is_gz = path.extension().map(|e| e == "gz").unwrap_or(false);
    if is_gz {
        Ok(Box::new(MultiGzDecoder::new(BufReader::new(file))))
    } else {
        Ok(Box::new(file))
    }
}

/// Reads the whole of `path` (decompressing if needed) into a string.
pub fn read_text(path: &Path) -> Result<String> {
    let mut reader = open_reader(path)?;
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| anyhow!(format!("reading '{}': {}", path.display(), e)))?;
    Ok(text)
}

/// Circuit name derived from the file name, without `.gz` and `.bench`.
fn circuit_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let stem = file_name.strip_suffix(".gz").unwrap_or(&file_name);
    stem.strip_suffix(".bench").unwrap_or(stem).to_string()
}

/// Loads and parses the netlist at `path`.
pub fn load_netlist_from_path(path: &Path) -> Result<Circuit> {
    let text = read_text(path)?;
    let circuit = parse_netlist_str(&circuit_name(path), &text)
        .map_err(|e| anyhow!(format!("{}: {}", path.display(), e)))?;
    Ok(circuit)
}

/// Loads a vector file: one bit-string per line, `#` comments allowed.
pub fn load_vectors_from_path(path: &Path) -> Result<Vec<InputVector>> {
    let text = read_text(path)?;
    Ok(parse_vectors(&text))
}

/// Loads a fault-list file in `<wire>-SA-<v>` / `<wire>-IN-<driver>-SA-<v>`
/// syntax.
pub fn load_faults_from_path(path: &Path) -> Result<Vec<Fault>> {
    let text = read_text(path)?;
    parse_fault_list(&text).map_err(|e| anyhow!(format!("{}: {}", path.display(), e)))
}
