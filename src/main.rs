use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pluginscout::archive::PluginArchive;
use pluginscout::discover::{validate, CandidateRoot};
use pluginscout::manifest::{Manifest, MANIFEST_LOCATION};
use pluginscout::{
    discover_all, AttributeService, CandidateLocation, DiscoverStrategy, DiscoveryConfig,
    PluginEnvironment, PluginLanguageService,
};

#[derive(Parser)]
#[command(name = "pluginscout")]
#[command(about = "Discover plugin archives and directories for a loader", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.pluginscout/config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log discovery decisions at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run discovery and print accepted candidates
    Scan {
        #[command(flatten)]
        service: ServiceArgs,

        /// Additional plugin directory (repeatable)
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,

        /// Additional search path entry (repeatable)
        #[arg(long = "search-path")]
        search_path: Vec<PathBuf>,

        /// Strategy to run (repeatable; defaults to the configured list)
        #[arg(long = "strategy")]
        strategies: Vec<DiscoverStrategy>,

        /// Print a JSON report with archive digests
        #[arg(long)]
        json: bool,
    },
    /// Print the manifest of one archive or directory
    Inspect {
        /// Archive file or exploded plugin directory
        path: PathBuf,

        /// Also report the verdict for this loader
        #[arg(long, requires = "metadata")]
        loader: Option<String>,

        /// Metadata file name expected under META-INF/
        #[arg(long, requires = "loader")]
        metadata: Option<String>,
    },
    /// List discovery strategies
    Strategies,
    /// Show version information
    Version,
}

#[derive(Args)]
struct ServiceArgs {
    /// Loader identifier matched against Loader-Id
    #[arg(long)]
    loader: String,

    /// Metadata file name expected under META-INF/
    #[arg(long)]
    metadata: String,

    /// Main attribute every manifest must carry (repeatable)
    #[arg(long = "require")]
    required: Vec<String>,

    /// Regex Plugin-Version must match
    #[arg(long)]
    version_pattern: Option<String>,
}

impl ServiceArgs {
    fn build(&self) -> anyhow::Result<AttributeService> {
        let mut service = AttributeService::new(&self.loader, &self.metadata);
        for attribute in &self.required {
            service = service.require_attribute(attribute);
        }
        if let Some(pattern) = &self.version_pattern {
            service = service.with_version_pattern(pattern)?;
        }
        Ok(service)
    }
}

#[derive(Serialize)]
struct ScanReport {
    loader: String,
    strategies: Vec<DiscoverStrategy>,
    candidates: Vec<ReportEntry>,
}

#[derive(Serialize)]
struct ReportEntry {
    #[serde(flatten)]
    location: CandidateLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
}

fn main() -> anyhow::Result<()> {
    // Load .env before the subscriber so RUST_LOG from it applies.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);
    debug!("{}", dotenv_outcome(&dotenv));

    match cli.command {
        Some(Commands::Version) | None => {
            println!("pluginscout {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Strategies) => {
            for strategy in DiscoverStrategy::ALL {
                println!("{}", strategy);
            }
        }
        Some(Commands::Scan {
            service,
            dirs,
            search_path,
            strategies,
            json,
        }) => {
            let mut config = DiscoveryConfig::load(cli.config.as_deref())?;
            config
                .plugin_dirs
                .extend(dirs.iter().map(|d| d.to_string_lossy().into_owned()));
            config
                .search_path
                .extend(search_path.iter().map(|p| p.to_string_lossy().into_owned()));
            if !strategies.is_empty() {
                config.strategies = strategies;
            }
            scan(&config, &service.build()?, json)?;
        }
        Some(Commands::Inspect {
            path,
            loader,
            metadata,
        }) => {
            let service = match (loader, metadata) {
                (Some(loader), Some(metadata)) => Some(AttributeService::new(loader, metadata)),
                _ => None,
            };
            inspect(&path, service.as_ref())?;
        }
    }

    Ok(())
}

fn dotenv_outcome(result: &dotenvy::Result<PathBuf>) -> String {
    match result {
        Ok(path) => format!("Loaded .env file from {}", path.display()),
        Err(e) => format!("No .env file loaded: {}", e),
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn scan(config: &DiscoveryConfig, service: &AttributeService, json: bool) -> anyhow::Result<()> {
    let env = PluginEnvironment::from_config(config);
    let candidates = discover_all(&env, service, &config.strategies)?;
    info!(
        loader = service.name(),
        candidates = candidates.len(),
        "Discovery complete"
    );

    if !json {
        for candidate in &candidates {
            println!("{}", candidate);
        }
        return Ok(());
    }

    let mut entries = Vec::with_capacity(candidates.len());
    for location in candidates {
        let sha256 = if location.is_archive() {
            Some(file_digest(location.path())?)
        } else {
            None
        };
        entries.push(ReportEntry { location, sha256 });
    }
    let report = ScanReport {
        loader: service.name().to_string(),
        strategies: config.strategies.clone(),
        candidates: entries,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn inspect(path: &Path, service: Option<&AttributeService>) -> anyhow::Result<()> {
    let env = PluginEnvironment::new();

    let verdict = if path.is_dir() {
        let manifest_path = path.join(MANIFEST_LOCATION);
        let file = File::open(&manifest_path)
            .with_context(|| format!("Failed to open {}", manifest_path.display()))?;
        let manifest = Manifest::from_reader(file)?;
        print_manifest(&manifest);
        service.map(|service| {
            validate(&env, Some(&manifest), &mut CandidateRoot::Directory(path), service)
        })
    } else if path.is_file() {
        let mut archive = PluginArchive::open(path)
            .with_context(|| format!("Failed to open {} as an archive", path.display()))?;
        let manifest = archive.manifest()?;
        match &manifest {
            Some(manifest) => print_manifest(manifest),
            None => println!("(no {})", MANIFEST_LOCATION),
        }
        service.map(|service| {
            validate(
                &env,
                manifest.as_ref(),
                &mut CandidateRoot::Archive(&mut archive),
                service,
            )
        })
    } else {
        bail!("{} does not exist", path.display());
    };

    match verdict {
        Some(Ok(())) => println!("\nverdict: accepted"),
        Some(Err(rejection)) => println!("\nverdict: rejected ({})", rejection),
        None => {}
    }
    Ok(())
}

fn print_manifest(manifest: &Manifest) {
    for (name, value) in manifest.main_attributes().iter() {
        println!("{}: {}", name, value);
    }
    for (section, attributes) in manifest.sections() {
        println!("\n[{}]", section);
        for (name, value) in attributes.iter() {
            println!("{}: {}", name, value);
        }
    }
}

fn file_digest(path: &Path) -> anyhow::Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
