// SPDX-License-Identifier: Apache-2.0

use colored::Colorize;

pub fn report_cli_error_and_exit(
    message: &str,
    subcommand: Option<&str>,
    details: Vec<(&str, &str)>,
) -> ! {
    let subcommand_str = if let Some(subcommand) = subcommand {
        format!("{}: ", subcommand)
    } else {
        String::new()
    };
    eprintln!("faultsim-driver: {}{}", subcommand_str, message.red().bold());
    for (key, value) in details {
        eprintln!("  {}: {}", key, value);
    }
    std::process::exit(1);
}

/// Reports an `anyhow` error, listing its causes as details, and exits.
pub fn report_error_chain_and_exit(error: &anyhow::Error, subcommand: &str) -> ! {
    let causes: Vec<String> = error.chain().skip(1).map(|c| c.to_string()).collect();
    let details = causes.iter().map(|c| ("caused by", c.as_str())).collect();
    report_cli_error_and_exit(&error.to_string(), Some(subcommand), details)
}
