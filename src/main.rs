//! memc-load - load installed-apps logs into memcached shards.

use anyhow::Result;
use clap::Parser;
use memc_loader::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_PATTERN, LoaderConfig, MAX_FILE_THREADS, MAX_LINE_THREADS,
};
use memc_loader::gate::NORMAL_ERR_RATE;
use memc_loader::logging::{LogConfig, init_logging};
use memc_loader::{MemcacheStore, ShardTable, pipeline, record};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};

#[derive(Parser, Debug)]
#[command(name = "memc-load")]
#[command(author, version, about = "Load installed-apps logs into memcached")]
struct Cli {
    /// Run the encoding self-check and exit
    #[arg(short, long)]
    test: bool,

    /// Log file (default: stdout)
    #[arg(short, long, env = "MEMC_LOADER_LOG")]
    log: Option<PathBuf>,

    /// Log intended writes instead of sending them
    #[arg(long)]
    dry: bool,

    /// Glob selecting input files
    #[arg(long, env = "MEMC_LOADER_PATTERN", default_value = DEFAULT_PATTERN)]
    pattern: String,

    /// memcached address for idfa devices
    #[arg(long, env = "MEMC_LOADER_IDFA", default_value = "127.0.0.1:33013")]
    idfa: String,

    /// memcached address for gaid devices
    #[arg(long, env = "MEMC_LOADER_GAID", default_value = "127.0.0.1:33014")]
    gaid: String,

    /// memcached address for adid devices
    #[arg(long, env = "MEMC_LOADER_ADID", default_value = "127.0.0.1:33015")]
    adid: String,

    /// memcached address for dvid devices
    #[arg(long, env = "MEMC_LOADER_DVID", default_value = "127.0.0.1:33016")]
    dvid: String,

    /// Files processed in parallel
    #[arg(long, env = "MEMC_LOADER_FILE_WORKERS", default_value_t = MAX_FILE_THREADS)]
    file_workers: usize,

    /// Lines processed in parallel within one file
    #[arg(long, env = "MEMC_LOADER_LINE_WORKERS", default_value_t = MAX_LINE_THREADS)]
    line_workers: usize,

    /// Error rate at which a file's load is reported as failed
    #[arg(long, env = "MEMC_LOADER_ERROR_THRESHOLD", default_value_t = NORMAL_ERR_RATE)]
    error_threshold: f64,

    /// Lines read per batch before dispatching to the line workers
    #[arg(long, env = "MEMC_LOADER_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

impl Cli {
    fn loader_config(&self) -> Result<LoaderConfig> {
        let shards = ShardTable::new()
            .with_shard("idfa", &self.idfa)
            .with_shard("gaid", &self.gaid)
            .with_shard("adid", &self.adid)
            .with_shard("dvid", &self.dvid);
        LoaderConfig::builder()
            .shards(shards)
            .dry_run(self.dry)
            .pattern(&self.pattern)
            .file_workers(self.file_workers)
            .line_workers(self.line_workers)
            .error_threshold(self.error_threshold)
            .batch_size(self.batch_size)
            .build()
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.dry { Level::DEBUG } else { Level::INFO })
        .file(cli.log.clone())
        .build();
    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Cannot initialise logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if cli.test {
        return match record::self_check() {
            Ok(()) => {
                info!("Self-check passed");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Self-check failed: {e:#}");
                ExitCode::FAILURE
            }
        };
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Unexpected error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.loader_config()?;
    info!("Memc loader started with options: {config}");
    pipeline::run(&config, &MemcacheStore::new())?;
    Ok(())
}
