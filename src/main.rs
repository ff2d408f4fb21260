use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tabled::{settings::Style, Table, Tabled};
use tracing::{info, warn};

use healthreport::export::json::SimpleHealthReport;
use healthreport::export::{export_document, export_to_file, ExportFormat};
use healthreport::logging::{init_logging, LogLevel};
use healthreport::{
    AppConfig, AssembleOptions, Band, EvaluationEngine, HealthSnapshot, PromptBuilder,
    ReportAssembler, SectionKind, Sex, SubjectContext,
};

/// healthreport - Personal Health Report CLI
///
/// Evaluates a health snapshot against reference ranges and lays the
/// results out as a paginated French-language report.
#[derive(Parser)]
#[command(name = "healthreport")]
#[command(version = "0.1.0")]
#[command(about = "Personal health report generator", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full report from a snapshot
    Report {
        /// Snapshot JSON file
        #[arg(long, value_name = "FILE")]
        snapshot: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (text, json, csv)
        #[arg(short = 'f', long, default_value = "text")]
        format: String,

        /// Use this file as the narrative page verbatim
        #[arg(long, value_name = "FILE")]
        narrative_file: Option<PathBuf>,

        /// Skip the narrative page
        #[arg(long)]
        no_narrative: bool,

        /// Add gait and respiratory sections
        #[arg(long)]
        extended: bool,
    },

    /// Evaluate a single metric value
    Evaluate {
        /// Metric id (see `catalog`)
        #[arg(short, long)]
        metric: String,

        /// Value in display units
        #[arg(long, allow_hyphen_values = true)]
        value: String,

        /// Subject sex (male, female, other, unknown)
        #[arg(short, long, default_value = "unknown")]
        sex: String,

        /// Body mass in kilograms, for protein targets
        #[arg(long, value_name = "KG")]
        mass: Option<String>,
    },

    /// List the metric catalog
    Catalog {
        /// Include gait and respiratory sections
        #[arg(long)]
        extended: bool,
    },

    /// Write the flat heart rate / steps / sleep / blood pressure JSON
    ExportSimple {
        /// Snapshot JSON file
        #[arg(long, value_name = "FILE")]
        snapshot: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the narrative prompt for an external language model
    Prompt {
        /// Snapshot JSON file
        #[arg(long, value_name = "FILE")]
        snapshot: PathBuf,
    },

    /// Build reports for every snapshot in a directory, in parallel
    Batch {
        /// Directory of snapshot JSON files
        #[arg(long, value_name = "DIR")]
        dir: PathBuf,

        /// Directory receiving one report per snapshot
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,

        /// Output format (text, json, csv)
        #[arg(short = 'f', long, default_value = "text")]
        format: String,
    },

    /// Configure application settings
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the active configuration
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref());
    if cli.verbose > 0 {
        config.logging.level = LogLevel::from_verbosity(cli.verbose);
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Report {
            snapshot,
            output,
            format,
            narrative_file,
            no_narrative,
            extended,
        } => {
            let format = parse_document_format(&format)?;
            let snapshot = load_snapshot(&snapshot)?;
            let assembler = ReportAssembler::from_config(&config)?;

            let external_narrative_text = match narrative_file {
                Some(path) => Some(
                    fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read narrative: {}", path.display()))?,
                ),
                None => None,
            };
            let options = AssembleOptions {
                include_narrative: config.report.include_narrative && !no_narrative,
                external_narrative_text,
                extended_sections: config.report.extended_sections || extended,
            };

            let document = assembler.assemble(&snapshot, &options)?;

            match output {
                Some(path) => {
                    export_to_file(&document, format, &path)?;
                    println!(
                        "{} {} ({} pages, {} entries)",
                        "✓ Report written to".green(),
                        path.display(),
                        document.page_count(),
                        document.entry_count()
                    );
                }
                None => export_document(&document, format, io::stdout().lock())?,
            }
        }

        Commands::Evaluate {
            metric,
            value,
            sex,
            mass,
        } => {
            let engine = EvaluationEngine::new(
                config.evaluation.unknown_sex_policy,
                config.derived.protein_factor,
            );
            if !engine.has_rule(&metric) {
                bail!("Unknown metric: {}", metric);
            }

            let value = Decimal::from_str(&value)
                .with_context(|| format!("Invalid value: {}", value))?;
            let sex = Sex::from_str(&sex).map_err(anyhow::Error::msg)?;
            let body_mass = mass
                .map(|m| Decimal::from_str(&m).with_context(|| format!("Invalid body mass: {}", m)))
                .transpose()?;

            let evaluation = engine.evaluate(&metric, value, &SubjectContext::new(sex, body_mass));
            let line = format!("{} {}", evaluation.band.symbol(), evaluation.message);
            println!("{}", colorize(evaluation.band, &line));
        }

        Commands::Catalog { extended } => {
            let assembler = ReportAssembler::from_config(&config)?;
            print_catalog(&assembler, extended)?;
        }

        Commands::ExportSimple { snapshot, output } => {
            let snapshot = load_snapshot(&snapshot)?;
            let assembler = ReportAssembler::from_config(&config)?;
            let report = SimpleHealthReport::from_snapshot(&snapshot, &assembler.derive(&snapshot));

            match output {
                Some(path) => {
                    let file = fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    report.write(io::BufWriter::new(file))?;
                    println!("{} {}", "✓ Simple export written to".green(), path.display());
                }
                None => {
                    let mut stdout = io::stdout().lock();
                    report.write(&mut stdout)?;
                    writeln!(stdout)?;
                }
            }
        }

        Commands::Prompt { snapshot } => {
            let snapshot = load_snapshot(&snapshot)?;
            let assembler = ReportAssembler::from_config(&config)?;
            let prompt = PromptBuilder::default().build(&assembler.narrative_summary(&snapshot));

            println!("{}", "SYSTEM".bold());
            println!("{}", prompt.system);
            println!();
            println!("{}", "USER".bold());
            println!("{}", prompt.user);
        }

        Commands::Batch {
            dir,
            out_dir,
            format,
        } => {
            let format = parse_document_format(&format)?;
            let inputs = snapshot_files(&dir)?;
            if inputs.is_empty() {
                bail!("No snapshot JSON files in {}", dir.display());
            }
            run_batch(&config, &inputs, &out_dir, format)?;
        }

        Commands::Config { init, show } => {
            if init {
                let path = match &cli.config {
                    Some(path) => {
                        config.save_to_file(path)?;
                        path.clone()
                    }
                    None => config.save_default()?,
                };
                println!("{} {}", "✓ Configuration written to".green(), path.display());
            }
            if show || !init {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn load_snapshot(path: &Path) -> Result<HealthSnapshot> {
    let snapshot = HealthSnapshot::from_json_file(path)
        .with_context(|| format!("Failed to load snapshot: {}", path.display()))?;
    info!(path = %path.display(), readings = snapshot.readings.len(), "Snapshot loaded");
    Ok(snapshot)
}

/// JSON files directly under `dir`, sorted by name
fn snapshot_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn parse_document_format(format: &str) -> Result<ExportFormat> {
    match ExportFormat::from_str(format)? {
        ExportFormat::Simple => bail!("Use the export-simple command for the simple format"),
        other => Ok(other),
    }
}

fn colorize(band: Band, line: &str) -> ColoredString {
    match band {
        Band::Good => line.green(),
        Band::Warn => line.yellow(),
        Band::Bad => line.red(),
        Band::Unmeasured => line.dimmed(),
    }
}

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Section")]
    section: &'static str,
    #[tabled(rename = "Id")]
    id: &'static str,
    #[tabled(rename = "Métrique")]
    title: &'static str,
    #[tabled(rename = "Unité")]
    unit: &'static str,
    #[tabled(rename = "Référence")]
    reference: &'static str,
}

fn print_catalog(assembler: &ReportAssembler, extended: bool) -> Result<()> {
    let kinds: &[SectionKind] = if extended {
        &SectionKind::EXTENDED_ORDER
    } else {
        &SectionKind::DEFAULT_ORDER
    };

    let catalog = assembler.catalog();
    let mut rows = Vec::new();
    for kind in kinds {
        let Some(section) = catalog.section(*kind) else {
            continue;
        };
        for id in &section.metric_ids {
            let definition = catalog
                .get(id)
                .with_context(|| format!("Catalog section lists unknown metric {}", id))?;
            rows.push(CatalogRow {
                section: kind.title(),
                id: definition.id,
                title: definition.title,
                unit: definition.unit,
                reference: definition.reference,
            });
        }
    }

    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn run_batch(config: &AppConfig, inputs: &[PathBuf], output_dir: &Path, format: ExportFormat) -> Result<()> {
    let assembler = ReportAssembler::from_config(config)?;
    let options = AssembleOptions {
        include_narrative: config.report.include_narrative,
        external_narrative_text: None,
        extended_sections: config.report.extended_sections,
    };

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading snapshots...");
    let mut loaded = Vec::new();
    let mut failures = 0usize;
    for path in inputs {
        match load_snapshot(path) {
            Ok(snapshot) => loaded.push((path, snapshot)),
            Err(e) => {
                failures += 1;
                warn!(path = %path.display(), error = %e, "Skipping snapshot");
                pb.inc(1);
            }
        }
    }

    pb.set_message("Assembling reports...");
    let (paths, snapshots): (Vec<_>, Vec<_>) = loaded.into_iter().unzip();
    let results = assembler.assemble_batch(&snapshots, &options);

    for (path, result) in paths.into_iter().zip(results) {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("report");
        let target = output_dir.join(format!("{}.{}", stem, format.extension()));

        match result.map_err(anyhow::Error::from).and_then(|document| {
            export_to_file(&document, format, &target).map_err(anyhow::Error::from)
        }) {
            Ok(()) => {}
            Err(e) => {
                failures += 1;
                warn!(path = %path.display(), error = %e, "Report failed");
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Done");

    let written = inputs.len() - failures;
    println!(
        "{} {} reports written to {}",
        "✓".green(),
        written,
        output_dir.display()
    );
    if failures > 0 {
        println!("{} {} snapshots failed", "⚠".yellow(), failures);
    }
    Ok(())
}
