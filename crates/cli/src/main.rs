use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use flexload_cache::{open_store, parse_cache_backend};
use flexload_indexer::{IndexCache, LoaderConfig, Resolver};
use report::{render_resolved, MapOutput, ResolvedSymbol};
use std::path::{Path, PathBuf};

mod report;

const DEFAULT_CONFIG_FILE: &str = "flexload.toml";

#[derive(Parser)]
#[command(name = "flexload")]
#[command(about = "Resolve symbol names to the files that declare them", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root directory to register (repeatable)
    #[arg(long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Ascend this many parent directories from each --root
    #[arg(long, global = true, default_value_t = 0)]
    depth: usize,

    /// TOML configuration file (default: ./flexload.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source file extensions (comma-separated)
    #[arg(long, global = true, value_delimiter = ',')]
    extensions: Vec<String>,

    /// Cache backend: file|memory|none
    #[arg(long, global = true)]
    cache_backend: Option<String>,

    /// Cache directory for the file backend
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Cache TTL in seconds (0 = never expires)
    #[arg(long, global = true)]
    cache_ttl_seconds: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Output JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve symbols against the registered roots
    Resolve(ResolveArgs),

    /// Force a scan of one directory and print its index entry
    Scan(ScanArgs),

    /// Print the merged class map of all registered roots
    Map,
}

#[derive(Args)]
struct ResolveArgs {
    /// Fully-qualified symbol names (`A.B.Name`, `A\B\Name` or `A::B::Name`)
    #[arg(required = true)]
    symbols: Vec<String>,
}

#[derive(Args)]
struct ScanArgs {
    /// Directory to scan
    #[arg(default_value = ".")]
    path: PathBuf,
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Resolve(args) => run_resolve(&cli, args, &config),
        Commands::Scan(args) => run_scan(&cli, args, &config),
        Commands::Map => run_map(&cli, &config),
    }
}

fn load_config(cli: &Cli) -> Result<LoaderConfig> {
    let mut config = match &cli.config {
        Some(path) => LoaderConfig::load(path)
            .with_context(|| format!("Cannot load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            LoaderConfig::load(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("Cannot load config {DEFAULT_CONFIG_FILE}"))?
        }
        None => LoaderConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("Invalid FLEXLOAD_* environment override")?;

    if !cli.extensions.is_empty() {
        config.extensions = cli.extensions.clone();
    }
    if let Some(backend) = &cli.cache_backend {
        config.cache.backend = parse_cache_backend(backend)?;
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache.dir = dir.clone();
    }
    if let Some(ttl) = cli.cache_ttl_seconds {
        config.cache_ttl_seconds = ttl;
    }
    config.validate()?;
    log::debug!("Effective configuration: {config:?}");
    Ok(config)
}

fn build_resolver(cli: &Cli, config: &LoaderConfig) -> Result<Resolver> {
    if cli.roots.is_empty() {
        anyhow::bail!("At least one --root is required");
    }
    let mut resolver = Resolver::from_config(config)?;
    for root in &cli.roots {
        resolver
            .register(root, cli.depth, true)
            .with_context(|| format!("Cannot register root {}", root.display()))?;
    }
    Ok(resolver)
}

fn run_resolve(cli: &Cli, args: &ResolveArgs, config: &LoaderConfig) -> Result<()> {
    let mut resolver = build_resolver(cli, config)?;

    let results: Vec<ResolvedSymbol> = args
        .symbols
        .iter()
        .map(|raw| match resolver.resolve_name(raw) {
            Ok(resolution) => ResolvedSymbol {
                symbol: raw.clone(),
                path: resolution.into_path(),
                error: None,
            },
            Err(err) => ResolvedSymbol {
                symbol: raw.clone(),
                path: None,
                error: Some(err.to_string()),
            },
        })
        .collect();

    print!("{}", render_resolved(&results, cli.json)?);
    if cli.json {
        println!();
    }

    let stats = resolver.stats();
    log::debug!(
        "memory hits: {}, misses: {}, rescans: {}, not found: {}",
        stats.memory_hits,
        stats.misses,
        stats.rescans,
        stats.not_found
    );

    if results.iter().any(|result| !result.is_resolved()) {
        std::process::exit(1);
    }
    Ok(())
}

fn run_scan(_cli: &Cli, args: &ScanArgs, config: &LoaderConfig) -> Result<()> {
    let path = args.path.canonicalize().context("Invalid scan path")?;
    if !path.is_dir() {
        anyhow::bail!("Scan path is not a directory: {}", path.display());
    }
    let mut index = IndexCache::new(config, open_store(&config.cache));
    let entry = index.load(&path, true);
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

fn run_map(cli: &Cli, config: &LoaderConfig) -> Result<()> {
    let resolver = build_resolver(cli, config)?;
    let registry = resolver.registry();
    let output = MapOutput {
        roots: registry.roots().to_vec(),
        search_path: registry.search_path().entries().to_vec(),
        namespaces: registry.namespaces().clone(),
        class_map: registry.class_map().clone(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
