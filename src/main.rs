use clap::Parser;
use colored::Colorize;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use tracing::info;

use resshrink::config::{ArchiveFormat, LinkedFormat, ModuleConfig, ShrinkConfig};
use resshrink::discovery::InputFinder;
use resshrink::report::{ReportFormat, Reporter};

/// resshrink - Find and strip unreachable Android resources
#[derive(Parser, Debug)]
#[command(name = "resshrink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project or unpacked archive directory
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compiled resource table (resources.arsc)
    #[arg(long, value_name = "FILE")]
    resource_table: Option<PathBuf>,

    /// R.txt symbol file (requires --package)
    #[arg(long, value_name = "FILE")]
    symbols: Option<PathBuf>,

    /// Package name of the module
    #[arg(long)]
    package: Option<String>,

    /// Resource directory (can be specified multiple times)
    #[arg(long, value_name = "DIR")]
    res: Vec<PathBuf>,

    /// AndroidManifest.xml, text or compiled
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Dex or smali file, or a directory of them (can be specified multiple times)
    #[arg(long, value_name = "PATH")]
    code: Vec<PathBuf>,

    /// Directory of XML files carrying tools:keep / tools:discard
    #[arg(long, value_name = "DIR")]
    keep_dir: Option<PathBuf>,

    /// ProGuard/R8 mapping.txt for obfuscated code
    #[arg(long, value_name = "FILE")]
    mapping: Option<PathBuf>,

    /// Scan web assets for resource URLs
    #[arg(long)]
    web_content: bool,

    /// Directory of web assets (can be specified multiple times)
    #[arg(long, value_name = "DIR")]
    web_dir: Vec<PathBuf>,

    /// Remove unused entries instead of replacing them with placeholders
    #[arg(long)]
    precise: bool,

    /// Shrink several packages together, qualifying resources by package
    #[arg(long)]
    multi_package: bool,

    /// Archive to rewrite
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Where to write the rewritten archive
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// The archive is an app bundle
    #[arg(long)]
    bundle: bool,

    /// The archive holds proto XML rather than binary XML
    #[arg(long)]
    proto: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Output file for the JSON report
    #[arg(long, value_name = "FILE")]
    report_output: Option<PathBuf>,

    /// Write the resource model dump to a file
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Write the `type/name#remove` resource configuration to a file
    #[arg(long, value_name = "FILE")]
    config_output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("resshrink v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    run(&config, &cli)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<ShrinkConfig> {
    let mut config = if let Some(config_path) = &cli.config {
        ShrinkConfig::from_file(config_path)?
    } else {
        // Try to load from default locations
        ShrinkConfig::from_default_locations(&cli.path)?.unwrap_or_default()
    };

    // Single-module flags override the first configured module
    let has_module_flags = cli.resource_table.is_some()
        || cli.symbols.is_some()
        || cli.manifest.is_some()
        || cli.keep_dir.is_some()
        || !cli.res.is_empty()
        || !cli.code.is_empty();
    if has_module_flags || cli.package.is_some() {
        if config.modules.is_empty() {
            config.modules.push(ModuleConfig {
                name: "base".to_string(),
                ..Default::default()
            });
        }
        let module = &mut config.modules[0];
        if let Some(package) = &cli.package {
            module.package = Some(package.clone());
        }
        if let Some(path) = &cli.resource_table {
            module.resource_table = Some(path.clone());
        }
        if let Some(path) = &cli.symbols {
            module.symbols = Some(path.clone());
        }
        if let Some(path) = &cli.manifest {
            module.manifest = Some(path.clone());
        }
        if let Some(path) = &cli.keep_dir {
            module.keep_dir = Some(path.clone());
        }
        if !cli.res.is_empty() {
            module.resources = cli.res.clone();
        }
        if !cli.code.is_empty() {
            module.code = cli.code.clone();
        }
    }

    // Nothing configured: look for the usual files under the project directory
    if config.modules.is_empty() {
        info!("No modules configured, discovering inputs in {}", cli.path.display());
        config.modules.push(InputFinder::new().discover_module(&cli.path));
    }

    if cli.mapping.is_some() {
        config.mapping = cli.mapping.clone();
    }
    config.web_content |= cli.web_content;
    config.web_content_dirs.extend(cli.web_dir.iter().cloned());
    config.precise_shrinking |= cli.precise;
    config.support_multipackages |= cli.multi_package;
    if cli.input.is_some() {
        config.archive.input = cli.input.clone();
    }
    if cli.output.is_some() {
        config.archive.output = cli.output.clone();
    }
    if cli.bundle {
        config.archive.format = ArchiveFormat::Bundle;
    }
    if cli.proto {
        config.archive.linked_format = LinkedFormat::Proto;
    }

    Ok(config)
}

fn run(config: &ShrinkConfig, cli: &Cli) -> Result<()> {
    let mut shrinker = config.build_shrinker()?;
    shrinker.analyze()?;

    if let Some(path) = &cli.dump {
        std::fs::write(path, shrinker.dump_resource_model())
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write model dump: {}", path.display()))?;
    }
    if let Some(path) = &cli.config_output {
        std::fs::write(path, shrinker.dump_config())
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write resource config: {}", path.display()))?;
    }

    let unused = shrinker.unused_resources();
    Reporter::new(cli.format.into(), cli.report_output.clone()).report(
        &unused,
        shrinker.store().len(),
        shrinker.store().safe_mode(),
    )?;

    let archive = &config.archive;
    match (&archive.input, &archive.output) {
        (Some(input), Some(output)) => {
            let stats = match archive.format {
                ArchiveFormat::Apk => {
                    shrinker.rewrite_apk(input, output, archive.linked_format.into())?
                }
                ArchiveFormat::Bundle => {
                    shrinker.rewrite_bundle(input, output, &config.module_packages())?
                }
            };
            if matches!(cli.format, OutputFormat::Terminal) {
                let action = if config.precise_shrinking { "removed" } else { "replaced" };
                let changed = stats.replaced + stats.removed;
                println!(
                    "{} {} ({} of {} entries {})",
                    "Wrote".green().bold(),
                    output.display(),
                    changed,
                    stats.entries,
                    action
                );
            }
        }
        (Some(_), None) => return Err(miette!("--output is required when rewriting an archive")),
        (None, Some(_)) => return Err(miette!("--input is required when rewriting an archive")),
        (None, None) => {}
    }

    Ok(())
}
