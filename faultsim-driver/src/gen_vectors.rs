// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use clap::ArgMatches;
use faultsim::vector::random_vectors;

use crate::common::{load_netlist_or_exit, open_output};
use crate::report_cli_error::report_error_chain_and_exit;

const SUBCOMMAND: &str = "gen-vectors";

pub fn handle_gen_vectors(matches: &ArgMatches) {
    let circuit = load_netlist_or_exit(matches, SUBCOMMAND);
    let count = *matches
        .get_one::<usize>("count")
        .expect("count is required");
    let seed = *matches
        .get_one::<u64>("seed")
        .expect("seed has a default value");

    let vectors = random_vectors(&circuit, count, seed);
    let result = open_output(matches).and_then(|mut out| {
        writeln!(
            out,
            "# {}: {} random vectors, seed {}",
            circuit.name, count, seed
        )?;
        for vector in &vectors {
            writeln!(out, "{}", vector)?;
        }
        out.flush()?;
        Ok(())
    });
    if let Err(e) = result {
        report_error_chain_and_exit(&e, SUBCOMMAND);
    }
}
