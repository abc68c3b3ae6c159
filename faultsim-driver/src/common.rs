// SPDX-License-Identifier: Apache-2.0

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use clap::ArgMatches;
use faultsim::netlist::circuit::Circuit;
use faultsim::netlist::io::load_netlist_from_path;

use crate::report_cli_error::report_error_chain_and_exit;

/// Loads `--netlist`, logging its summary, or exits with the load error.
pub fn load_netlist_or_exit(matches: &ArgMatches, subcommand: &str) -> Circuit {
    let netlist_path = matches
        .get_one::<String>("netlist")
        .expect("netlist path is required");
    let circuit = match load_netlist_from_path(Path::new(netlist_path)) {
        Ok(circuit) => circuit,
        Err(e) => report_error_chain_and_exit(&e, subcommand),
    };
    let stats = circuit.stats();
    log::info!(
        "{}: {} inputs, {} outputs, {} gates",
        circuit.name,
        stats.inputs,
        stats.outputs,
        stats.gates
    );
    for (kind, count) in &stats.gate_counts {
        log::debug!("  {}: {}", kind, count);
    }
    circuit
}

/// Buffered writer for `--output`, or stdout when the flag is absent.
pub fn open_output(matches: &ArgMatches) -> anyhow::Result<Box<dyn Write>> {
    match matches.get_one::<String>("output") {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| anyhow::anyhow!("creating '{}': {}", path, e))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(std::io::stdout()))),
    }
}
