// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use clap::ArgMatches;
use faultsim::coverage::golden_line;
use faultsim::fault_sim::simulate_golden;
use faultsim::netlist::io::load_vectors_from_path;

use crate::common::load_netlist_or_exit;
use crate::config::{get_sim_options, FaultsimConfig};
use crate::report_cli_error::{report_cli_error_and_exit, report_error_chain_and_exit};

const SUBCOMMAND: &str = "golden-sim";

pub fn handle_golden_sim(matches: &ArgMatches, config: &Option<FaultsimConfig>) {
    let options = match get_sim_options(matches, config) {
        Ok(options) => options,
        Err(e) => report_cli_error_and_exit(&e, Some(SUBCOMMAND), vec![]),
    };
    let circuit = load_netlist_or_exit(matches, SUBCOMMAND);
    let vectors_path = matches
        .get_one::<String>("vectors")
        .expect("vectors path is required");
    let vectors = match load_vectors_from_path(Path::new(vectors_path)) {
        Ok(vectors) => vectors,
        Err(e) => report_error_chain_and_exit(&e, SUBCOMMAND),
    };

    match simulate_golden(&circuit, &vectors, &options) {
        Ok(golden) => {
            for g in &golden {
                println!("{}", golden_line(g));
            }
        }
        Err(e) => report_cli_error_and_exit(
            &e.to_string(),
            Some(SUBCOMMAND),
            vec![("netlist", circuit.name.as_str())],
        ),
    }
}
