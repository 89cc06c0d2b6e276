//! CLI binary for transcat: scan PHP/Blade sources into a translation catalog.

mod progress;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use progress::{ScanProgress, summary_lines};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use transcat_catalog::{SqliteCatalog, TranslationLoader};
use transcat_core::config::{TranscatConfig, parse_flag};
use transcat_scan::{EventSink, ScanOrchestrator};

#[derive(Parser)]
#[command(name = "transcat", about = "Translation source catalog for PHP and Blade projects")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan sources and reconcile the catalog
    Parse {
        /// Directory to scan instead of the configured roots (repeatable)
        #[arg(long = "root", value_name = "DIR")]
        roots: Vec<PathBuf>,

        /// Delete sources no longer found (overrides config)
        #[arg(long, value_name = "FLAG", value_parser = parse_flag, num_args = 0..=1, default_missing_value = "true")]
        delete: Option<bool>,

        /// Mark sources no longer found as missing (overrides config)
        #[arg(long, value_name = "FLAG", value_parser = parse_flag, num_args = 0..=1, default_missing_value = "true")]
        mark: Option<bool>,
    },

    /// Create the catalog tables
    Tables,

    /// Print the stored translations for a locale and group as JSON
    Load {
        locale: String,

        /// Translation group; use `*` with `--namespace '*'` for text sources
        group: String,

        #[arg(short, long)]
        namespace: Option<String>,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;

    match cli.command {
        Commands::Parse {
            roots,
            delete,
            mark,
        } => cmd_parse(&project_root, &roots, delete, mark),
        Commands::Tables => cmd_tables(&project_root),
        Commands::Load {
            locale,
            group,
            namespace,
        } => cmd_load(&project_root, &locale, &group, namespace.as_deref()),
    }
}

fn load_config(project_root: &Path) -> Result<TranscatConfig> {
    TranscatConfig::load(project_root).with_context(|| {
        format!(
            "failed to load {}",
            TranscatConfig::config_path(project_root).display()
        )
    })
}

fn open_catalog(project_root: &Path, config: &TranscatConfig) -> Result<SqliteCatalog> {
    let db_path = config.database_path(project_root);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    SqliteCatalog::open(&db_path, config.tables.clone())
        .with_context(|| format!("failed to open catalog {}", db_path.display()))
}

fn cmd_parse(
    project_root: &Path,
    roots: &[PathBuf],
    delete: Option<bool>,
    mark: Option<bool>,
) -> Result<()> {
    let config = load_config(project_root)?;
    let roots = config.resolve_roots(project_root, roots);
    let policy = config.missing_policy(delete, mark);
    let catalog = open_catalog(project_root, &config)?;
    tracing::debug!(?roots, ?policy, "starting scan");

    let (tx, rx) = mpsc::channel();
    let display = ScanProgress::spawn(rx);
    let result = {
        let mut scan =
            ScanOrchestrator::from_config(&catalog, &config)?.with_events(EventSink::new(tx));
        scan.run(&roots, policy)
    };
    // Dropping the orchestrator closed the channel; the display thread exits after draining it.
    let _ = display.join();

    let summary = result.context("scan failed")?;
    for line in summary_lines(&summary) {
        println!("{line}");
    }
    Ok(())
}

fn cmd_tables(project_root: &Path) -> Result<()> {
    let config = load_config(project_root)?;
    open_catalog(project_root, &config)?;
    println!(
        "Catalog tables ready in {} ({}, {}, {}).",
        config.database_path(project_root).display(),
        config.tables.source_grouped,
        config.tables.source_text,
        config.tables.translations
    );
    Ok(())
}

fn cmd_load(project_root: &Path, locale: &str, group: &str, namespace: Option<&str>) -> Result<()> {
    let config = load_config(project_root)?;
    let catalog = open_catalog(project_root, &config)?;
    let loader = TranslationLoader::new(&catalog, config.source_locale.clone());
    let messages = loader
        .load(locale, group, namespace)
        .with_context(|| format!("failed to load {locale}/{group}"))?;
    println!("{}", serde_json::to_string_pretty(&messages)?);
    Ok(())
}
