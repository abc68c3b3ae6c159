// SPDX-License-Identifier: Apache-2.0

//! Command line driver for the `faultsim` single stuck-at fault simulator.
//!
//! Commands are given like:
//!
//! ```text
//! faultsim-driver <global-options> <command> <command-args-and-options>
//! ```
//!
//! Commands are:
//!
//! - fault-sim: Fault-simulates a vector file against a fault list and
//!   writes the coverage report.
//! - gen-fault-list: Writes the full single stuck-at fault list of a netlist.
//! - golden-sim: Simulates a vector file on the fault-free netlist.
//! - gen-vectors: Writes seeded random input vectors for a netlist.
//!
//! Sample usage:
//!
//! ```shell
//! $ cargo run -- gen-fault-list --netlist c17.bench --output c17_faults.txt
//! $ cargo run -- fault-sim --netlist c17.bench --vectors input.txt \
//!     --faults c17_faults.txt --output fault_sim_result.txt
//! ```

mod common;
mod config;
mod fault_sim;
mod gen_fault_list;
mod gen_vectors;
mod golden_sim;
mod report_cli_error;

use std::path::Path;

use clap::{Arg, ArgAction};
use config::{load_config, FaultsimConfig, DEFAULT_CONFIG_FILE};
use report_cli_error::{report_cli_error_and_exit, report_error_chain_and_exit};

trait AppExt {
    fn add_netlist_arg(self) -> Self;
    fn add_vectors_arg(self) -> Self;
    fn add_output_arg(self, help: &'static str) -> Self;
    fn add_sim_args(self) -> Self;
}

impl AppExt for clap::Command {
    fn add_netlist_arg(self) -> Self {
        self.arg(
            Arg::new("netlist")
                .long("netlist")
                .value_name("NETLIST")
                .help("Netlist in .bench format (optionally .gz)")
                .required(true)
                .action(ArgAction::Set),
        )
    }

    fn add_vectors_arg(self) -> Self {
        self.arg(
            Arg::new("vectors")
                .long("vectors")
                .value_name("VECTORS")
                .help("Input vector file, one bit-string per line")
                .required(true)
                .action(ArgAction::Set),
        )
    }

    fn add_output_arg(self, help: &'static str) -> Self {
        self.arg(
            Arg::new("output")
                .long("output")
                .value_name("OUTPUT")
                .help(help)
                .action(ArgAction::Set),
        )
    }

    fn add_sim_args(self) -> Self {
        self.arg(
            Arg::new("register_policy")
                .long("register_policy")
                .value_name("POLICY")
                .value_parser(["reset-per-vector", "persistent"])
                .help("Whether DFF state carries over between vectors")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("max_steps")
                .long("max_steps")
                .value_name("STEPS")
                .value_parser(clap::value_parser!(usize))
                .help("Upper bound on scheduler steps per simulation run")
                .action(ArgAction::Set),
        )
    }
}

fn main() {
    let _ = env_logger::try_init();

    log::info!(
        "faultsim-driver starting; version: {}",
        env!("CARGO_PKG_VERSION")
    );

    let matches = clap::Command::new("faultsim-driver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Three-valued single stuck-at fault simulator")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("CONFIG")
                .help("Path to a faultsim.toml file")
                .action(ArgAction::Set),
        )
        .subcommand(clap::Command::new("version").about("Prints the version of the driver"))
        .subcommand(
            clap::Command::new("fault-sim")
                .about("Fault-simulates vectors against a fault list and reports coverage")
                .add_netlist_arg()
                .add_vectors_arg()
                .arg(
                    Arg::new("faults")
                        .long("faults")
                        .value_name("FAULTS")
                        .help("Fault list file; the full fault list is used when omitted")
                        .action(ArgAction::Set),
                )
                .add_output_arg("Report file; stdout when omitted")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .value_name("JSON")
                        .help("Also write a JSON summary to this path")
                        .action(ArgAction::Set),
                )
                .add_sim_args()
                .arg(
                    Arg::new("parallelism")
                        .long("parallelism")
                        .value_name("STRATEGY")
                        .value_parser(["fault-parallel", "single-threaded"])
                        .help("How faults are spread over threads")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("threads")
                        .long("threads")
                        .value_name("N")
                        .value_parser(clap::value_parser!(usize))
                        .help("Worker threads for fault-parallel runs (default: CPU count)")
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            clap::Command::new("gen-fault-list")
                .about("Writes the full single stuck-at fault list of a netlist")
                .add_netlist_arg()
                .add_output_arg("Fault list file; stdout when omitted"),
        )
        .subcommand(
            clap::Command::new("golden-sim")
                .about("Simulates vectors on the fault-free netlist")
                .add_netlist_arg()
                .add_vectors_arg()
                .add_sim_args(),
        )
        .subcommand(
            clap::Command::new("gen-vectors")
                .about("Writes seeded random {0,1} input vectors for a netlist")
                .add_netlist_arg()
                .arg(
                    Arg::new("count")
                        .long("count")
                        .value_name("COUNT")
                        .value_parser(clap::value_parser!(usize))
                        .required(true)
                        .help("Number of vectors to generate")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_name("SEED")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("0")
                        .help("Seed for the vector stream")
                        .action(ArgAction::Set),
                )
                .add_output_arg("Vector file; stdout when omitted"),
        )
        .get_matches();

    let mut toml_path: Option<String> = matches.get_one::<String>("config").cloned();

    // Without --config, fall back to faultsim.toml in the working directory.
    if toml_path.is_none() {
        let cwd_toml_path = Path::new(DEFAULT_CONFIG_FILE);
        if cwd_toml_path.exists() {
            log::info!("Using {} in current directory", DEFAULT_CONFIG_FILE);
            toml_path = Some(DEFAULT_CONFIG_FILE.to_string());
        }
    }

    let config: Option<FaultsimConfig> = toml_path.map(|path| {
        if !Path::new(&path).exists() {
            report_cli_error_and_exit(
                "config toml file does not exist",
                None,
                vec![("path", &path)],
            );
        }
        match load_config(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => report_error_chain_and_exit(&e, "config"),
        }
    });

    if let Some(matches) = matches.subcommand_matches("fault-sim") {
        fault_sim::handle_fault_sim(matches, &config);
    } else if let Some(matches) = matches.subcommand_matches("gen-fault-list") {
        gen_fault_list::handle_gen_fault_list(matches);
    } else if let Some(matches) = matches.subcommand_matches("golden-sim") {
        golden_sim::handle_golden_sim(matches, &config);
    } else if let Some(matches) = matches.subcommand_matches("gen-vectors") {
        gen_vectors::handle_gen_vectors(matches);
    } else if let Some(_matches) = matches.subcommand_matches("version") {
        println!("{}", env!("CARGO_PKG_VERSION"));
    } else {
        report_cli_error_and_exit("No valid subcommand provided.", None, vec![]);
    }
}
