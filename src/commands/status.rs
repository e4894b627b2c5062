//! Status command - report on the prebuilt index and catalog

use anyhow::Result;
use colored::Colorize;

use gadget_search::{Catalog, EngineConfig, LoadError, VectorIndex};

/// Run status command
pub fn run(config: &EngineConfig, json: bool) -> Result<()> {
    let paths = config.paths();

    let index = VectorIndex::open(&paths.index);
    let catalog = Catalog::load(&paths.catalog);

    let index_rows = index.as_ref().ok().map(VectorIndex::len);
    let catalog_rows = catalog.as_ref().ok().map(Catalog::len);
    let consistent = matches!((index_rows, catalog_rows), (Some(a), Some(b)) if a == b);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "prefix": paths.prefix.display().to_string(),
                "model": config.model,
                "index": {
                    "path": paths.index.display().to_string(),
                    "rows": index_rows,
                    "dimension": index.as_ref().ok().map(VectorIndex::dimension),
                    "model": index.as_ref().ok().and_then(VectorIndex::model),
                    "error": index.as_ref().err().map(ToString::to_string),
                },
                "catalog": {
                    "path": paths.catalog.display().to_string(),
                    "rows": catalog_rows,
                    "unique_names": catalog.as_ref().ok().map(Catalog::unique_names),
                    "error": catalog.as_ref().err().map(ToString::to_string),
                },
                "consistent": consistent,
            }))?
        );
        return Ok(());
    }

    println!("{}", "Index Status".bold());
    println!();
    println!("  {} Prefix: {}", "→".dimmed(), paths.prefix.display());
    println!("  {} Model: {}", "→".dimmed(), config.model.cyan());
    println!();

    match &index {
        Ok(index) => {
            println!(
                "  {} {} vectors ({} dimensions)",
                "✓".green(),
                index.len().to_string().cyan(),
                index.dimension()
            );
            if let Some(model) = index.model() {
                println!("    {} Built with: {}", "→".dimmed(), model);
            }
        }
        Err(e) => print_problem(e),
    }

    match &catalog {
        Ok(catalog) => println!(
            "  {} {} catalog rows, {} unique gadgets",
            "✓".green(),
            catalog.len().to_string().cyan(),
            catalog.unique_names().to_string().cyan()
        ),
        Err(e) => print_problem(e),
    }

    println!();
    if consistent {
        println!("{} Index and catalog are aligned", "✓".green().bold());
    } else if let (Some(a), Some(b)) = (index_rows, catalog_rows) {
        let mismatch = LoadError::CardinalityMismatch {
            index_rows: a,
            catalog_rows: b,
        };
        println!("{} {}", "✗".red().bold(), mismatch);
        println!("  {}", mismatch.hint().dimmed());
    } else {
        println!("{} Search is unavailable", "✗".red().bold());
    }

    Ok(())
}

fn print_problem(error: &LoadError) {
    println!("  {} {}", "✗".red(), error);
    println!("    {}", error.hint().dimmed());
}
