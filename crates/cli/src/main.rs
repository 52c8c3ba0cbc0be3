use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shotgroup_core::{
    build_plan, execute_plan, scan_directory, AppConfig, ExecuteOptions, ExecutionReport,
    GroupDatabase, MetadataResolver, NamingScheme, PlanOptions, RenamePlan, TransferMode,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shotgroup", version, about = "Group, catalog and rename photo libraries")]
struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and write the group database
    Build {
        /// Directory to scan
        directory: PathBuf,
        /// Where to write the database
        #[arg(short, long, default_value = "groups.json")]
        output: PathBuf,
        /// Descend into subdirectories (the default unless configured off)
        #[arg(long, conflicts_with = "no_recursive")]
        recursive: bool,
        /// Do not descend into subdirectories
        #[arg(long)]
        no_recursive: bool,
    },
    /// Rename grouped files into a destination directory
    Rename {
        /// Group database produced by `build`
        database: PathBuf,
        /// Destination directory
        destination: PathBuf,
        /// Naming scheme, e.g. "{date}_{camera_model}_{sequence}"
        #[arg(short, long)]
        scheme: Option<String>,
        /// Zero-padding width for {sequence}
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
        sequence_digits: Option<u8>,
        /// Show what would happen without touching any file
        #[arg(long)]
        dry_run: bool,
        /// Copy files instead of moving them
        #[arg(long)]
        copy: bool,
        /// Skip groups with missing metadata (the default)
        #[arg(long, conflicts_with = "include_invalid")]
        skip_invalid: bool,
        /// Rename groups with missing metadata using "unknown" placeholders
        #[arg(long)]
        include_invalid: bool,
        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the active configuration and where it comes from
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Build {
            directory,
            output,
            recursive,
            no_recursive,
        } => {
            run_build(&directory, &output, recursive, no_recursive)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Rename {
            database,
            destination,
            scheme,
            sequence_digits,
            dry_run,
            copy,
            skip_invalid: _,
            include_invalid,
            output,
        } => run_rename(RenameArgs {
            database,
            destination,
            scheme,
            sequence_digits,
            dry_run,
            copy,
            include_invalid,
            output,
        }),
        Command::Config {
            command: ConfigCommand::Show,
        } => {
            run_config_show()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_build(
    directory: &std::path::Path,
    output: &std::path::Path,
    recursive: bool,
    no_recursive: bool,
) -> Result<()> {
    let config = AppConfig::load()?;
    let recursive = recursive || (!no_recursive && config.recursive);

    let mut outcome = scan_directory(directory, recursive)?;
    let resolver = MetadataResolver::with_default_backends();
    let resolved = resolver.resolve_all(&mut outcome.groups);

    let database = GroupDatabase::new(outcome.groups, outcome.stats);
    database.save(output)?;

    println!(
        "{} groups from {} files ({} with capture dates), {} unsupported files skipped",
        database.groups.len(),
        database.stats.grouped_files,
        resolved,
        database.stats.skipped_unsupported
    );
    println!("database written to {}", output.display());
    Ok(())
}

struct RenameArgs {
    database: PathBuf,
    destination: PathBuf,
    scheme: Option<String>,
    sequence_digits: Option<u8>,
    dry_run: bool,
    copy: bool,
    include_invalid: bool,
    output: OutputFormat,
}

fn run_rename(args: RenameArgs) -> Result<ExitCode> {
    let config = AppConfig::load()?;
    let scheme_text = args.scheme.unwrap_or_else(|| config.scheme.clone());
    let scheme = NamingScheme::parse(&scheme_text)
        .with_context(|| format!("invalid naming scheme: {scheme_text}"))?;

    let mut database = GroupDatabase::load(&args.database)?;

    let mut plan_options = PlanOptions::new(scheme);
    plan_options.sequence_digits = args.sequence_digits.unwrap_or(config.sequence_digits);
    plan_options.include_invalid = args.include_invalid;
    let plan = build_plan(&mut database, &plan_options)?;

    let execute_options = ExecuteOptions {
        destination: args.destination,
        mode: if args.copy {
            TransferMode::Copy
        } else {
            TransferMode::Move
        },
        dry_run: args.dry_run,
    };
    let report = execute_plan(&plan, &execute_options)?;

    match args.output {
        OutputFormat::Table => print_table(&plan, &report),
        OutputFormat::Json => print_json(&plan, &report)?,
    }

    if report.is_total_failure() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_table(plan: &RenamePlan, report: &ExecutionReport) {
    if report.dry_run {
        println!("dry run: no files were touched");
    }
    for group in &plan.groups {
        println!("{} -> {}", group.key, group.rendered);
    }
    for skipped in &plan.skipped {
        println!("{} skipped ({})", skipped.key, skipped.reason);
    }
    for failed in &report.failed {
        println!("{} failed: {}", failed.key, failed.reason);
    }
    println!(
        "{} groups done, {} files, {} skipped, {} failed",
        report.succeeded.len(),
        report.transferred_files,
        plan.skipped.len(),
        report.failed.len()
    );
}

fn print_json(plan: &RenamePlan, report: &ExecutionReport) -> Result<()> {
    let combined = serde_json::json!({
        "plan": plan,
        "report": report,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&combined).context("failed to serialize report")?
    );
    Ok(())
}

fn run_config_show() -> Result<()> {
    let config = AppConfig::load()?;
    match shotgroup_core::config::config_path() {
        Some(path) if path.exists() => println!("# loaded from {}", path.display()),
        Some(path) => println!("# defaults ({} not present)", path.display()),
        None => println!("# defaults (no config directory available)"),
    }
    print!("{}", toml::to_string_pretty(&config).context("failed to render config")?);
    Ok(())
}
