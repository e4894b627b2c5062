//! CLI subcommands

pub mod search;
pub mod status;

use colored::Colorize;
use gadget_search::LoadError;

/// Report a failed engine load with its remediation hint and exit
pub(crate) fn exit_with_load_error(error: &LoadError, json: bool) -> ! {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "error": error.to_string(),
                "hint": error.hint(),
            })
        );
    } else {
        eprintln!("{} {}", "Error:".red().bold(), error);
        eprintln!();
        eprintln!("  {}", error.hint());
    }
    std::process::exit(1);
}
