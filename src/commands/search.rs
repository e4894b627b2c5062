//! Search command - find gadgets by describing what they do

use anyhow::Result;
use colored::Colorize;

use gadget_search::{EngineConfig, SearchEngine, SearchError};

/// Run search command
pub fn run(config: &EngineConfig, query: &str, k: usize, json: bool) -> Result<()> {
    let engine = match SearchEngine::open(config) {
        Ok(engine) => engine,
        Err(SearchError::Load(e)) => super::exit_with_load_error(&e, json),
        Err(e) => return Err(e.into()),
    };

    let results = engine.search(query, k)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!(
            "{} No gadgets found matching: {}. Try phrasing it differently.",
            "!".yellow(),
            query.cyan()
        );
        return Ok(());
    }

    println!(
        "{} Top {} results for: {}",
        "→".dimmed(),
        results.len(),
        query.cyan()
    );
    println!();

    for (i, result) in results.iter().enumerate() {
        let score_str = format!("{:.2}", result.score);
        let score_colored = if result.score > 0.8 {
            score_str.green()
        } else if result.score > 0.6 {
            score_str.yellow()
        } else {
            score_str.dimmed()
        };

        println!(
            "{}. [{}] {}",
            (i + 1).to_string().bold(),
            score_colored,
            result.name.cyan()
        );

        // Truncate function text for display (char-aware for Unicode)
        let function = if result.function.chars().count() > 100 {
            format!("{}...", result.function.chars().take(100).collect::<String>())
        } else {
            result.function.clone()
        };
        println!("   {}", function.dimmed());
        println!();
    }

    Ok(())
}
