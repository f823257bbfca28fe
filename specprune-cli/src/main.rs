mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use config::{CliOverrides, ConfigMerger};
use fs_err as fs;
use specprune_core::adapters::{FsDescriptorSink, FsDescriptorSource};
use specprune_core::pipeline::{self, ToolError};
use specprune_core::settings::RunSettings;
use specprune_core::{InsertionPoint, MacroTable};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "specprune",
    version,
    about = "Strip unsupported subpackages from an RPM spec file and merge spec fragments into it."
)]
struct Cli {
    /// Spec file to prune; rewritten in place.
    primary: Utf8PathBuf,

    /// Spec fragments merged into the primary, in order.
    secondaries: Vec<Utf8PathBuf>,

    /// Config file (default: ./specprune.toml when present).
    #[arg(long, value_name = "PATH")]
    config: Option<Utf8PathBuf>,

    /// Additional subpackage to remove (repeatable).
    #[arg(long = "package", value_name = "NAME")]
    packages: Vec<String>,

    /// Additional section kind to remove per subpackage (repeatable).
    #[arg(long = "section-kind", value_name = "KIND")]
    section_kinds: Vec<String>,

    /// Additional substring marking install lines to drop (repeatable).
    #[arg(long = "keyword", value_name = "TEXT")]
    keywords: Vec<String>,

    /// Seed a macro before parsing, overriding the bootstrap value (repeatable).
    #[arg(long = "define", value_name = "NAME=VALUE")]
    defines: Vec<String>,

    /// Insert merged sections before the last section of this kind.
    #[arg(long, value_name = "KIND", conflicts_with = "insert_offset")]
    insert_before: Option<String>,

    /// Insert merged sections this many sections before the end (default: 3).
    #[arg(long, value_name = "N")]
    insert_offset: Option<usize>,

    /// Print the resulting diff instead of writing the primary.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Write a JSON run report to this path.
    #[arg(long, value_name = "PATH")]
    report: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version print to stdout and succeed
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match real_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn real_main(cli: Cli) -> Result<(), ToolError> {
    let file_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(Utf8Path::new(".")).context("load specprune.toml config")?,
    };

    let defines = config::parse_defines(&cli.defines).map_err(|e| ToolError::Usage(e.to_string()))?;
    let insertion = match (cli.insert_before, cli.insert_offset) {
        (Some(kind), _) => Some(InsertionPoint::BeforeLast(kind)),
        (None, Some(n)) => Some(InsertionPoint::FromEnd(n)),
        (None, None) => None,
    };
    let merged = ConfigMerger::new(file_config).merge_cli(&CliOverrides {
        packages: cli.packages,
        section_kinds: cli.section_kinds,
        keywords: cli.keywords,
        defines,
        insertion,
    })?;

    debug!(
        "merged config: packages={:?}, section_kinds={:?}, keywords={:?}, insertion={}",
        merged.packages, merged.section_kinds, merged.extra_install_keywords, merged.insertion
    );

    let mut macros = MacroTable::bootstrap();
    macros.extend(merged.macros);

    let settings = RunSettings {
        primary: cli.primary,
        secondaries: cli.secondaries,
        packages: merged.packages,
        section_kinds: merged.section_kinds,
        extra_install_keywords: merged.extra_install_keywords,
        macros,
        insertion: merged.insertion,
        dry_run: cli.dry_run,
    };

    let outcome = pipeline::run(&settings, &FsDescriptorSource, &FsDescriptorSink)?;

    for notice in &outcome.notices {
        println!("{notice}");
    }
    if settings.dry_run {
        print!("{}", outcome.patch);
    }

    if let Some(path) = &cli.report {
        let json = outcome.report(&settings).to_json()?;
        fs::write(path, json).with_context(|| format!("write {}", path))?;
        info!("wrote report to {}", path);
    }

    Ok(())
}
