mod debug_report;

use anyhow::{Context as _, Result};
use clap::Parser;
use riglogic::{CatalogDocument, ConfidenceMatcher, OptionQuery, Part, PartIndex, Resolver, Rule, build_manifest};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Resolve a machine configuration from a catalog file and reconcile
/// extracted order options against it.
#[derive(Parser, Debug)]
#[command(name = "riglogic", version)]
#[command(after_help = "Exit codes:\n  0  Success.\n  1  Internal error.\n  2  Invalid arguments or catalog.")]
struct Args {
    /// Catalog document (JSON: model, parts, rules, glossary, knowledge, settings).
    #[arg(long, short = 'c')]
    catalog: PathBuf,

    /// Confirmed part id (repeatable).
    #[arg(long = "confirm", value_name = "ID")]
    confirmed: Vec<String>,

    /// Extracted option to match, as CATEGORY=SELECTION (repeatable).
    #[arg(long = "query", short = 'q', value_name = "CATEGORY=SELECTION", value_parser = parse_query)]
    queries: Vec<OptionQuery>,

    /// Override the catalog's resolver pass bound.
    #[arg(long)]
    max_passes: Option<usize>,

    /// Force ANSI color output.
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long)]
    no_color: bool,
}

fn parse_query(s: &str) -> Result<OptionQuery, String> {
    let (category, selection) =
        s.split_once('=').ok_or_else(|| format!("invalid query '{s}' (expected CATEGORY=SELECTION)"))?;
    if category.trim().is_empty() {
        return Err(format!("invalid query '{s}' (empty category)"));
    }
    Ok(OptionQuery::new(category.trim(), selection.trim()))
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_env("RIGLOGIC_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let color = if args.color {
        true
    } else if args.no_color {
        false
    } else {
        io::stdout().is_terminal()
    };

    let catalog = match load(&args) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&args, &catalog, color) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

struct Catalog {
    document: CatalogDocument,
    parts: Vec<Part>,
    rules: Vec<Rule>,
}

fn load(args: &Args) -> Result<Catalog> {
    let document = CatalogDocument::load(&args.catalog)
        .with_context(|| format!("failed to load catalog {}", args.catalog.display()))?;
    let parts = document.parts().context("invalid part row")?;
    let rules = document.rules().context("invalid rule row")?;
    Ok(Catalog { document, parts, rules })
}

fn run(args: &Args, catalog: &Catalog, color: bool) -> Result<()> {
    let Catalog { document, parts, rules } = catalog;
    let index = PartIndex::with_glossary(parts, &document.glossary);

    let mut resolve_options = document.settings.resolve.clone();
    if let Some(max_passes) = args.max_passes {
        resolve_options.max_passes = max_passes;
    }

    for id in &args.confirmed {
        if !index.contains(id) {
            tracing::warn!(part = %id, "confirmed id not in catalog");
        }
    }

    let resolver = Resolver::with_options(&index, rules, resolve_options);
    let resolution = resolver.run(&args.confirmed);
    let diagnostics = resolver.compiled().diagnostics();
    let manifest = build_manifest(parts, &args.confirmed, &resolution.implied);

    let knowledge = document.knowledge_store();
    let matcher = ConfidenceMatcher::new(&index)
        .with_options(document.settings.matching.clone())
        .with_knowledge(knowledge.view(&document.model));
    let matches = matcher.match_all(&args.queries);

    let report = debug_report::Report {
        model: &document.model,
        confirmed: &args.confirmed,
        resolution: &resolution,
        manifest: &manifest,
        diagnostics: &diagnostics,
        matches: &matches,
    };
    debug_report::print_report(&mut io::stdout().lock(), &report, color).context("failed to write report")
}
