mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use adsync_merge::DEFAULT_BANNER;
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "adsync")]
#[command(about = "app-ads.txt reconciliation against a master list", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every publisher's app-ads.txt and reconcile it against the master.
    /// Writes report.json, report.md and patch files under <out_dir>/<run_id>/.
    Check {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<PathBuf>,

        /// Master file (overrides master.path)
        #[arg(long)]
        master: Option<PathBuf>,

        /// Exports root (overrides report.out_dir)
        #[arg(long = "out-dir")]
        out_dir: Option<PathBuf>,

        /// Exit 1 when any publisher is not OK
        #[arg(long, default_value_t = false)]
        fail_on_drift: bool,

        /// Fail instead of warn on config keys this command does not read
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },

    /// Append the records of a patch file that are missing from a local app-ads.txt.
    /// Existing lines are never touched; merging twice equals merging once.
    Merge {
        /// Existing app-ads.txt
        #[arg(long = "in")]
        input: PathBuf,

        /// Patch file (e.g. patches/<domain>_missing.txt)
        #[arg(long = "add")]
        patch: PathBuf,

        /// Output path (defaults to --in)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Comment line written above the appended block (flag alone uses the default banner)
        #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_BANNER)]
        banner: Option<String>,

        /// Print the merged text instead of writing it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Rewrite a master file in canonical form (deduplicated, sorted, framed).
    Canonicalize {
        /// Master file to canonicalize
        path: PathBuf,

        /// Output path (defaults to the input path)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Comment header written above the markers
        #[arg(long)]
        header: Option<String>,
    },

    /// Absorb partner files into the master and write an update report.
    Update {
        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<PathBuf>,

        /// Master file (overrides master.path)
        #[arg(long)]
        master: Option<PathBuf>,

        /// Directory of partner *.txt files (overrides update.partners_dir)
        #[arg(long = "partners-dir")]
        partners_dir: Option<PathBuf>,

        /// Exports root (overrides report.out_dir)
        #[arg(long = "out-dir")]
        out_dir: Option<PathBuf>,

        /// Report only; leave the master file as it is
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Validate a sellers.json file, optionally cross-checking seller ids
    /// against the master records of one ad system.
    SellersCheck {
        /// sellers.json path
        #[arg(long)]
        file: PathBuf,

        /// Ad-system domain whose master records should list every seller_id
        #[arg(long = "system-domain")]
        system_domain: Option<String>,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<PathBuf>,

        /// Master file (overrides master.path)
        #[arg(long)]
        master: Option<PathBuf>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides...)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::from(commands::EXIT_FATAL)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.cmd {
        Commands::Check {
            config_paths,
            master,
            out_dir,
            fail_on_drift,
            strict_config,
        } => {
            commands::check::check(commands::check::CheckArgs {
                config_paths,
                master,
                out_dir,
                fail_on_drift,
                strict_config,
            })
            .await
        }

        Commands::Merge {
            input,
            patch,
            out,
            banner,
            dry_run,
        } => commands::files::merge(&input, &patch, out.as_deref(), banner, dry_run),

        Commands::Canonicalize { path, out, header } => {
            commands::files::canonicalize(&path, out.as_deref(), header.as_deref())
        }

        Commands::Update {
            config_paths,
            master,
            partners_dir,
            out_dir,
            dry_run,
        } => commands::update::update(commands::update::UpdateArgs {
            config_paths,
            master,
            partners_dir,
            out_dir,
            dry_run,
        }),

        Commands::SellersCheck {
            file,
            system_domain,
            config_paths,
            master,
        } => commands::sellers::sellers_check(
            &file,
            system_domain.as_deref(),
            &config_paths,
            master,
        ),

        Commands::ConfigHash { paths } => {
            let loaded = adsync_config::load_layered_yaml(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        // stdout carries command output
        .with_writer(std::io::stderr)
        .init();
}
