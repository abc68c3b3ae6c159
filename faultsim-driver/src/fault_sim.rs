// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::Path;

use clap::ArgMatches;
use faultsim::coverage::{write_report, Coverage, FaultSimSummary, ReportHeader};
use faultsim::fault::full_fault_list;
use faultsim::fault_sim::{run_fault_sim, FaultLedger};
use faultsim::netlist::io::{load_faults_from_path, load_vectors_from_path};

use crate::common::{load_netlist_or_exit, open_output};
use crate::config::{get_fault_sim_options, FaultsimConfig};
use crate::report_cli_error::{report_cli_error_and_exit, report_error_chain_and_exit};

const SUBCOMMAND: &str = "fault-sim";

/// Label used in the report header when no fault list file was given.
const FULL_FAULT_LIST_LABEL: &str = "(full fault list)";

pub fn handle_fault_sim(matches: &ArgMatches, config: &Option<FaultsimConfig>) {
    let options = match get_fault_sim_options(matches, config) {
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

    let faults_path = matches.get_one::<String>("faults");
    let faults = match faults_path {
        Some(path) => match load_faults_from_path(Path::new(path)) {
            Ok(faults) => faults,
            Err(e) => report_error_chain_and_exit(&e, SUBCOMMAND),
        },
        None => full_fault_list(&circuit),
    };

    let mut ledger = FaultLedger::new(faults);
    let report = match run_fault_sim(&circuit, &vectors, &mut ledger, &options) {
        Ok(report) => report,
        Err(e) => report_cli_error_and_exit(
            &e.to_string(),
            Some(SUBCOMMAND),
            vec![("netlist", circuit.name.as_str())],
        ),
    };
    log::info!("fault coverage: {}", Coverage::of(&ledger));

    let netlist_path = matches
        .get_one::<String>("netlist")
        .expect("netlist path is required");
    let header = ReportHeader {
        netlist: netlist_path.to_string(),
        vectors: vectors_path.to_string(),
        faults: faults_path
            .map(|s| s.to_string())
            .unwrap_or_else(|| FULL_FAULT_LIST_LABEL.to_string()),
    };
    let written = open_output(matches).and_then(|mut out| {
        write_report(&mut out, &header, &report, &ledger)?;
        out.flush()?;
        Ok(())
    });
    if let Err(e) = written {
        report_error_chain_and_exit(&e, SUBCOMMAND);
    }

    if let Some(json_path) = matches.get_one::<String>("json") {
        let summary = FaultSimSummary::new(&circuit.name, &report, &ledger);
        let written = summary
            .to_json()
            .map_err(anyhow::Error::from)
            .and_then(|json| {
                std::fs::write(json_path, json)
                    .map_err(|e| anyhow::anyhow!("writing '{}': {}", json_path, e))
            });
        if let Err(e) = written {
            report_error_chain_and_exit(&e, SUBCOMMAND);
        }
    }
}
