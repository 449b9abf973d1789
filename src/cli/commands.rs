//! Command implementations for the sound-db CLI
//!
//! This module contains command execution, progress reporting and output
//! rendering (human, JSON or CSV).

use crate::accessor::SiteOutcome;
use crate::cli::args::{
    AccessArgs, Args, Commands, MetadataArgs, OutputFormat, ReadArgs, SelectionArgs, SitesArgs,
};
use crate::config::SoundDbConfig;
use crate::constants::DEFAULT_PREVIEW_ROWS;
use crate::identifier::{decode_data_dir_name, decode_site_id};
use crate::metadata::load_metadata;
use crate::models::{Collected, SiteData, SiteSpecifier};
use crate::{AccessOptions, SoundDb};
use anyhow::{Context, Result, bail};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Main command runner
///
/// Sets up logging, loads configuration, indexes the raw data root and
/// dispatches to the selected subcommand. `cancellation_token` is cancelled
/// by the binary on Ctrl-C and checked between sites.
pub fn run(args: Args, cancellation_token: CancellationToken) -> Result<()> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    args.validate()?;
    let config = load_configuration(&args)?;
    debug!("Loaded configuration: {:?}", config);

    let Some(command) = args.command.clone() else {
        bail!("No command given; run `sound-db --help` for usage");
    };

    let open = SoundDb::open;
    let options = AccessOptions::default()
        .with_quiet(config.quiet)
        .with_cancellation_token(cancellation_token);

    match command {
        Commands::Decode { value } => run_decode(&value, args.output_format),
        Commands::Metadata(metadata) => run_metadata(&args, &config, &metadata),
        Commands::Sites(sites) => run_sites(&open(config), &sites, args.output_format),
        Commands::Accessors => run_accessors(&open(config), args.output_format),
        Commands::Paths(selection) => {
            run_paths(&open(config), &selection, options, args.output_format)
        }
        Commands::Read(read) => run_read(&args, &open(config), &read, options),
        Commands::Access(access) => run_access(&open(config), &access, args.output_format),
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sound_db={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (file -> env -> args)
fn load_configuration(args: &Args) -> Result<SoundDbConfig> {
    let mut config = SoundDbConfig::load(args.config_file.as_deref())
        .context("Failed to load configuration")?;

    if let Some(root) = &args.root {
        config = config.with_raw_data_root(root);
    }
    if args.quiet {
        config = config.with_quiet(true);
    } else if args.verbose > 0 {
        config = config.with_quiet(false);
    }

    config.validate()?;
    info!("Raw data root: {}", config.raw_data_root.display());
    Ok(config)
}

/// All indexed site IDs, used when a command names no sites
fn all_sites(db: &SoundDb) -> Vec<String> {
    db.index().entries().map(|(key, _)| key.site_id()).collect()
}

fn selected_sites(db: &SoundDb, selection: &SelectionArgs) -> Vec<String> {
    if selection.sites.is_empty() {
        all_sites(db)
    } else {
        selection.sites.clone()
    }
}

fn run_sites(db: &SoundDb, filter: &SitesArgs, format: OutputFormat) -> Result<()> {
    let entries: Vec<_> = db
        .index()
        .entries()
        .filter(|(key, _)| filter.unit.as_ref().is_none_or(|unit| key.unit == *unit))
        .filter(|(key, _)| filter.year.as_ref().is_none_or(|year| key.year == *year))
        .collect();

    match format {
        OutputFormat::Human => {
            println!(
                "{} {}",
                entries.len().to_string().bright_white().bold(),
                "sites".bright_green().bold()
            );
            for (key, path) in &entries {
                println!("  {}  {}", key.site_id().bright_white(), path.display());
            }
            for (key, paths) in db.index().duplicates() {
                println!(
                    "  {}  {} directories, excluded",
                    key.site_id().bright_red().bold(),
                    paths.len()
                );
            }
        }
        OutputFormat::Json => {
            let rows: Vec<_> = entries
                .iter()
                .map(|(key, path)| {
                    serde_json::json!({
                        "site_id": key.site_id(),
                        "unit": key.unit,
                        "site": key.site,
                        "year": key.year,
                        "path": path,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Csv => {
            let mut df = df!(
                "site_id" => entries.iter().map(|(k, _)| k.site_id()).collect::<Vec<_>>(),
                "unit" => entries.iter().map(|(k, _)| k.unit.clone()).collect::<Vec<_>>(),
                "site" => entries.iter().map(|(k, _)| k.site.clone()).collect::<Vec<_>>(),
                "year" => entries.iter().map(|(k, _)| k.year.clone()).collect::<Vec<_>>(),
                "path" => entries
                    .iter()
                    .map(|(_, p)| p.display().to_string())
                    .collect::<Vec<_>>(),
            )?;
            write_csv(&mut df, None)?;
        }
    }
    Ok(())
}

fn run_accessors(db: &SoundDb, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = db
                .registry()
                .iter()
                .map(|accessor| {
                    serde_json::json!({
                        "name": accessor.name(),
                        "description": accessor.description(),
                        "template": accessor.template().to_string(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Human | OutputFormat::Csv => {
            for accessor in db.registry().iter() {
                println!(
                    "{:<14} {}\n{:<14} {}",
                    accessor.name().bright_green().bold(),
                    accessor.description(),
                    "",
                    accessor.template().to_string().dimmed()
                );
            }
        }
    }
    Ok(())
}

fn run_decode(value: &str, format: OutputFormat) -> Result<()> {
    let (key, title) = match decode_site_id(value) {
        Ok(key) => (key, None),
        Err(_) => {
            let name = decode_data_dir_name(value).with_context(|| {
                format!("'{}' is neither a site ID nor a directory name", value)
            })?;
            (name.key, Some(name.title).filter(|title| !title.is_empty()))
        }
    };

    match format {
        OutputFormat::Json => {
            let decoded = serde_json::json!({
                "site_id": key.site_id(),
                "unit": key.unit,
                "site": key.site,
                "year": key.year,
                "title": title,
            });
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
        OutputFormat::Human | OutputFormat::Csv => {
            println!("site_id: {}", key.site_id().bright_white().bold());
            println!("unit:    {}", key.unit);
            println!("site:    {}", key.site);
            println!("year:    {}", key.year);
            if let Some(title) = title {
                println!("title:   {}", title);
            }
        }
    }
    Ok(())
}

fn run_paths(
    db: &SoundDb,
    selection: &SelectionArgs,
    options: AccessOptions,
    format: OutputFormat,
) -> Result<()> {
    let options = options.with_parse_options(selection.options.clone().unwrap_or_default());
    let sites = selected_sites(db, selection);
    let resolved = db.paths(&selection.accessor, &sites, &options)?;

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = resolved
                .iter()
                .map(|(resolved, key)| {
                    serde_json::json!({
                        "site_id": key.site_id(),
                        "paths": resolved.paths(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Human | OutputFormat::Csv => {
            for (resolved, key) in &resolved {
                for path in resolved.paths() {
                    println!("{}\t{}", key.site_id(), path.display());
                }
            }
        }
    }

    if resolved.len() < sites.len() {
        info!(
            "{} of {} sites could not be resolved",
            sites.len() - resolved.len(),
            sites.len()
        );
    }
    Ok(())
}

fn run_read(args: &Args, db: &SoundDb, read: &ReadArgs, options: AccessOptions) -> Result<()> {
    let selection = &read.selection;
    let options = options.with_parse_options(selection.options.clone().unwrap_or_default());
    let accessor = db.accessor(&selection.accessor)?;
    let sites = selected_sites(db, selection);

    info!("Reading '{}' for {} sites", accessor.name(), sites.len());

    let progress_bar = if args.show_progress() {
        let pb = ProgressBar::new(sites.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Reading {}", accessor.name()));
        Some(pb)
    } else {
        None
    };

    let mut skipped = 0usize;
    let collected = accessor.collect_all_with(db.index(), &sites, &options, |outcome| {
        if let Some(pb) = &progress_bar {
            pb.inc(1);
        }
        if matches!(outcome, SiteOutcome::Skipped(_)) {
            skipped += 1;
        }
    });
    if let Some(pb) = &progress_bar {
        pb.finish_and_clear();
    }
    let collected = collected?;

    info!(
        "Read {} sites ({} skipped)",
        collected.site_count(),
        skipped
    );

    match collected {
        Collected::Table(mut df) => {
            emit_table(&mut df, args.output_format, read.output_file.as_deref(), skipped)
        }
        Collected::BySite(results) => {
            if read.output_file.is_some() {
                bail!(
                    "'{}' results for these sites cannot be combined into one table",
                    accessor.name()
                );
            }
            for (key, data) in results {
                println!("{}", key.site_id().bright_green().bold());
                emit_site_data(data, args.output_format, None)?;
            }
            Ok(())
        }
    }
}

fn run_access(db: &SoundDb, access: &AccessArgs, format: OutputFormat) -> Result<()> {
    let specifier = SiteSpecifier::from_parts(&access.specifier)?;
    let options = access.options.clone().unwrap_or_default();
    let data = db.access(&access.accessor, &specifier, &options)?;
    emit_site_data(data, format, access.output_file.as_deref())
}

fn run_metadata(args: &Args, config: &SoundDbConfig, metadata: &MetadataArgs) -> Result<()> {
    let (metadata_path, derived_path) = match (&metadata.metadata, &metadata.derived) {
        (Some(m), Some(d)) => (m.clone(), d.clone()),
        _ => match (&config.metadata_path, &config.derived_data_path) {
            (Some(m), Some(d)) => (m.clone(), d.clone()),
            _ => bail!("No metadata tables given; pass --metadata and --derived"),
        },
    };

    let mut df = load_metadata(&metadata_path, &derived_path).with_context(|| {
        format!(
            "Failed to merge {} with {}",
            metadata_path.display(),
            derived_path.display()
        )
    })?;
    emit_table(&mut df, args.output_format, metadata.output_file.as_deref(), 0)
}

fn emit_site_data(data: SiteData, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    match data {
        SiteData::Table(mut df) => emit_table(&mut df, format, output, 0),
        SiteData::Files(files) => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                for file in files {
                    println!("{}", file.display());
                }
            }
            Ok(())
        }
    }
}

/// Print or export a table
///
/// With an output file the table is always written as CSV. JSON output is
/// a summary of the table's shape.
fn emit_table(
    df: &mut DataFrame,
    format: OutputFormat,
    output: Option<&Path>,
    skipped: usize,
) -> Result<()> {
    if let Some(path) = output {
        write_csv(df, Some(path))?;
        info!("Wrote {} rows to {}", df.height(), path.display());
        return Ok(());
    }

    match format {
        OutputFormat::Csv => write_csv(df, None),
        OutputFormat::Json => {
            let columns: Vec<String> = df
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect();
            let summary = serde_json::json!({
                "rows": df.height(),
                "columns": columns,
                "skipped_sites": skipped,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        OutputFormat::Human => {
            println!("{}", df.head(Some(DEFAULT_PREVIEW_ROWS)));
            println!(
                "{} rows x {} columns",
                df.height().to_string().bright_white().bold(),
                df.width().to_string().bright_white().bold()
            );
            if skipped > 0 {
                println!(
                    "{} sites skipped (use -v for details)",
                    skipped.to_string().bright_red().bold()
                );
            }
            Ok(())
        }
    }
}

fn write_csv(df: &mut DataFrame, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            CsvWriter::new(&mut file).include_header(true).finish(df)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            CsvWriter::new(&mut stdout).include_header(true).finish(df)?;
        }
    }
    Ok(())
}
