//! Kronika command-line resolver
//!
//! Loads entity sources and a player roster, optionally applies session
//! directives, then resolves each query given on the command line and prints
//! one JSON line per query.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use kronika::merge::{merge_state, ChangeDirective, MergeOptions};
use kronika::{
    EntityKind, EntitySource, EntityStore, IdentitySpace, OwnerKind, Player, Query,
    ResolutionCache, ResolverConfig,
};

/// Command-line configuration
struct Config {
    /// Entity sources, lowest primacy first
    sources: Vec<PathBuf>,
    /// Player roster (JSON array)
    players: Option<PathBuf>,
    /// Change directives (JSON array)
    directives: Option<PathBuf>,
    /// Resolver config (JSON)
    config: Option<PathBuf>,
    /// Type filter applied to every query
    filter: Option<OwnerKind>,
    /// Reference date for derived fields
    as_of: Option<NaiveDate>,
    /// Threads used to parse sources
    workers: usize,
    /// Names to resolve
    queries: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            players: None,
            directives: None,
            config: None,
            filter: None,
            as_of: None,
            workers: 1,
            queries: Vec::new(),
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    args.get(i + 1)
        .map_or_else(|| fail(&format!("{flag} requires a value")), String::as_str)
}

fn parse_filter(value: &str) -> OwnerKind {
    match value.to_lowercase().as_str() {
        "roster:player" => OwnerKind::Player,
        "roster:character" => OwnerKind::Character,
        other => other
            .parse::<EntityKind>()
            .map_or_else(|e| fail(&e.to_string()), OwnerKind::from),
    }
}

fn print_help() {
    println!("kronika - resolve campaign names against an entity snapshot");
    println!();
    println!("USAGE:");
    println!("    kronika [OPTIONS] <QUERY>...");
    println!();
    println!("OPTIONS:");
    println!("    -s, --source <FILE>       Entity source, repeatable; later sources win");
    println!("    -p, --players <FILE>      Player roster");
    println!("    -d, --directives <FILE>   Session directives to merge before resolving");
    println!("    -c, --config <FILE>       Resolver config");
    println!("    -t, --type <KIND>         Only accept owners of this kind; an entity kind,");
    println!("                              roster:player or roster:character");
    println!("        --as-of <DATE>        Reference date for current values");
    println!("    -j, --workers <N>         Threads for source parsing [default: 1]");
    println!("    -h, --help                Print help information");
    println!();
    println!("Set RUST_LOG to control diagnostics, e.g. RUST_LOG=kronika=debug.");
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            flag @ ("--source" | "-s") => {
                config.sources.push(PathBuf::from(value_of(&args, i, flag)));
                i += 2;
            }
            flag @ ("--players" | "-p") => {
                config.players = Some(PathBuf::from(value_of(&args, i, flag)));
                i += 2;
            }
            flag @ ("--directives" | "-d") => {
                config.directives = Some(PathBuf::from(value_of(&args, i, flag)));
                i += 2;
            }
            flag @ ("--config" | "-c") => {
                config.config = Some(PathBuf::from(value_of(&args, i, flag)));
                i += 2;
            }
            flag @ ("--type" | "-t") => {
                config.filter = Some(parse_filter(value_of(&args, i, flag)));
                i += 2;
            }
            flag @ "--as-of" => {
                let value = value_of(&args, i, flag);
                config.as_of = Some(
                    value
                        .parse()
                        .unwrap_or_else(|_| fail(&format!("invalid date: {value}"))),
                );
                i += 2;
            }
            flag @ ("--workers" | "-j") => {
                let value = value_of(&args, i, flag);
                config.workers = value
                    .parse()
                    .unwrap_or_else(|_| fail(&format!("invalid worker count: {value}")));
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if arg.starts_with('-') => fail(&format!("unknown argument: {arg}")),
            query => {
                config.queries.push(query.to_string());
                i += 1;
            }
        }
    }

    config
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("cannot decode {}: {e}", path.display()).into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,kronika=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = parse_args();
    let resolver_config = match &config.config {
        Some(path) => ResolverConfig::from_path(path)?,
        None => ResolverConfig::default(),
    };

    let sources = config
        .sources
        .iter()
        .enumerate()
        .map(|(primacy, path)| {
            let primacy = i32::try_from(primacy).unwrap_or(i32::MAX);
            EntitySource::from_path(path.display().to_string(), primacy, path)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut store = EntityStore::from_sources_parallel(&sources, config.workers)?;
    tracing::info!(sources = sources.len(), entities = store.len(), "snapshot loaded");

    let players: Vec<Player> = match &config.players {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    if let Some(path) = &config.directives {
        let directives: Vec<ChangeDirective> = read_json(path)?;
        let options = MergeOptions {
            as_of: config.as_of,
            resolver: resolver_config.clone(),
        };
        let outcome = merge_state(store, &players, &directives, &options);
        tracing::info!(
            applied = outcome.report.applied,
            touched = outcome.report.touched.len(),
            skipped = outcome.report.skipped.len(),
            "directives merged"
        );
        store = outcome.store;
    } else if config.as_of.is_some() {
        store.finalize(config.as_of);
    }

    let space = IdentitySpace::build(&store, &players, resolver_config);
    let resolver = space.resolver();
    let mut cache = ResolutionCache::new();

    for text in &config.queries {
        let mut query = Query::new(text.as_str());
        query.filter = config.filter;
        let line = match resolver.lookup(&query, Some(&mut cache)) {
            Some(resolution) => {
                let path = resolution
                    .owner
                    .entity_id()
                    .and_then(|id| store.get(id))
                    .and_then(|entity| entity.canonical_path.clone());
                serde_json::json!({
                    "query": text,
                    "resolution": resolution,
                    "canonical_path": path,
                })
            }
            None => serde_json::json!({ "query": text, "resolution": null }),
        };
        println!("{line}");
    }

    Ok(())
}
