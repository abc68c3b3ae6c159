// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use clap::ArgMatches;
use faultsim::fault::{full_fault_list, write_fault_list};

use crate::common::{load_netlist_or_exit, open_output};
use crate::report_cli_error::report_error_chain_and_exit;

const SUBCOMMAND: &str = "gen-fault-list";

pub fn handle_gen_fault_list(matches: &ArgMatches) {
    let circuit = load_netlist_or_exit(matches, SUBCOMMAND);
    let faults = full_fault_list(&circuit);
    log::info!("{}: {} faults", circuit.name, faults.len());

    let netlist_path = matches
        .get_one::<String>("netlist")
        .expect("netlist path is required");
    let result = open_output(matches).and_then(|mut out| {
        write_fault_list(&mut out, netlist_path, &faults)?;
        out.flush()?;
        Ok(())
    });
    if let Err(e) = result {
        report_error_chain_and_exit(&e, SUBCOMMAND);
    }
}
