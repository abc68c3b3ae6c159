// SPDX-License-Identifier: Apache-2.0

//! `faultsim.toml` handling.
//!
//! A flag given on the command line always wins over the file, and the file
//! wins over the library defaults.

use std::path::Path;

use clap::ArgMatches;
use faultsim::fault_sim::{FaultSimOptions, ParallelismStrategy};
use faultsim::gate_sim::{RegisterPolicy, SimOptions};
use serde::Deserialize;

/// Name of the config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "faultsim.toml";

#[derive(Deserialize, Debug, Default)]
pub struct FaultsimConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// `"reset-per-vector"` or `"persistent"`.
    pub register_policy: Option<String>,

    /// `"fault-parallel"` or `"single-threaded"`.
    pub parallelism: Option<String>,

    /// Worker threads for fault-parallel runs.
    pub threads: Option<usize>,

    /// Cap on scheduler steps per simulation run.
    pub max_steps: Option<usize>,
}

pub fn load_config(path: &Path) -> anyhow::Result<FaultsimConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading '{}': {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| anyhow::anyhow!("parsing '{}': {}", path.display(), e))
}

/// Flag value if given, else the config value.
fn flag_or_config(
    matches: &ArgMatches,
    flag: &str,
    from_config: Option<&String>,
) -> Option<String> {
    matches
        .get_one::<String>(flag)
        .or(from_config)
        .map(|s| s.to_string())
}

fn usize_flag_or_config(
    matches: &ArgMatches,
    flag: &str,
    from_config: Option<usize>,
) -> Option<usize> {
    matches.get_one::<usize>(flag).copied().or(from_config)
}

/// Scheduler options from `--register_policy` and `--max_steps`.
pub fn get_sim_options(
    matches: &ArgMatches,
    config: &Option<FaultsimConfig>,
) -> Result<SimOptions, String> {
    let sim = config.as_ref().map(|c| &c.simulation);
    let register_policy = match flag_or_config(
        matches,
        "register_policy",
        sim.and_then(|s| s.register_policy.as_ref()),
    ) {
        Some(s) => s.parse::<RegisterPolicy>()?,
        None => RegisterPolicy::default(),
    };
    let max_steps = usize_flag_or_config(matches, "max_steps", sim.and_then(|s| s.max_steps));
    Ok(SimOptions {
        register_policy,
        max_steps,
    })
}

/// Everything [`get_sim_options`] reads plus `--parallelism` and
/// `--threads`.
pub fn get_fault_sim_options(
    matches: &ArgMatches,
    config: &Option<FaultsimConfig>,
) -> Result<FaultSimOptions, String> {
    let sim = config.as_ref().map(|c| &c.simulation);
    let parallelism = match flag_or_config(
        matches,
        "parallelism",
        sim.and_then(|s| s.parallelism.as_ref()),
    ) {
        Some(s) => s.parse::<ParallelismStrategy>()?,
        None => ParallelismStrategy::default(),
    };
    let threads = usize_flag_or_config(matches, "threads", sim.and_then(|s| s.threads));
    if threads == Some(0) {
        return Err("thread count must be at least 1".to_string());
    }
    Ok(FaultSimOptions {
        sim: get_sim_options(matches, config)?,
        parallelism,
        threads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, ArgAction, Command};

    fn command() -> Command {
        Command::new("t")
            .arg(
                Arg::new("register_policy")
                    .long("register_policy")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("parallelism")
                    .long("parallelism")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("threads")
                    .long("threads")
                    .value_parser(clap::value_parser!(usize))
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("max_steps")
                    .long("max_steps")
                    .value_parser(clap::value_parser!(usize))
                    .action(ArgAction::Set),
            )
    }

    fn config(text: &str) -> Option<FaultsimConfig> {
        Some(toml::from_str(text).unwrap())
    }

    #[test]
    fn test_defaults_without_config() {
        let matches = command().get_matches_from(["t"]);
        let options = get_fault_sim_options(&matches, &None).unwrap();
        assert_eq!(options.sim, SimOptions::default());
        assert_eq!(options.parallelism, ParallelismStrategy::FaultParallel);
        assert_eq!(options.threads, None);
    }

    #[test]
    fn test_config_supplies_defaults() {
        let matches = command().get_matches_from(["t"]);
        let cfg = config(
            "[simulation]\nregister_policy = \"persistent\"\nparallelism = \"single-threaded\"\nthreads = 3\nmax_steps = 50\n",
        );
        let options = get_fault_sim_options(&matches, &cfg).unwrap();
        assert_eq!(options.sim.register_policy, RegisterPolicy::Persistent);
        assert_eq!(options.sim.max_steps, Some(50));
        assert_eq!(options.parallelism, ParallelismStrategy::SingleThreaded);
        assert_eq!(options.threads, Some(3));
    }

    #[test]
    fn test_flag_beats_config() {
        let matches = command().get_matches_from([
            "t",
            "--register_policy",
            "reset-per-vector",
            "--threads",
            "2",
        ]);
        let cfg = config("[simulation]\nregister_policy = \"persistent\"\nthreads = 8\n");
        let options = get_fault_sim_options(&matches, &cfg).unwrap();
        assert_eq!(options.sim.register_policy, RegisterPolicy::ResetPerVector);
        assert_eq!(options.threads, Some(2));
    }

    #[test]
    fn test_bad_values_are_reported() {
        let matches = command().get_matches_from(["t", "--register_policy", "sticky"]);
        assert!(get_sim_options(&matches, &None).is_err());
        let matches = command().get_matches_from(["t", "--threads", "0"]);
        assert!(get_fault_sim_options(&matches, &None).is_err());
    }

    #[test]
    fn test_unknown_config_key_is_rejected() {
        let parsed: Result<FaultsimConfig, _> = toml::from_str("[simulation]\nthread = 4\n");
        assert!(parsed.is_err());
    }
}
