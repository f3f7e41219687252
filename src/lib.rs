//! # memc-loader
//!
//! Bulk loader for "installed applications" logs. Each input file is a
//! tab-separated, optionally compressed log with one device per line:
//!
//! ```text
//! idfa	1rfw452y52g2gq4g	55.55	42.42	1423,43,567,3,7,23
//! ```
//!
//! Every line is parsed into an [`AppsInstalled`] record, routed by device type
//! to one memcached shard, and stored under `"<device_type>:<device_id>"` as a
//! compact binary [`UserApps`] value.
//!
//! ## Pipeline
//!
//! - [`io::glob`] finds input files and sorts them.
//! - [`pipeline::run`] processes files on `file_workers` threads; each file
//!   gets its own bounded line pool ([`pipeline::process_file`]).
//! - [`parser`] turns a line into a record or a rejection.
//! - [`router`] picks the shard for the record's device type.
//! - [`writer`] encodes the record and makes one write attempt.
//! - [`gate`] rates the file's errors and marks the file as consumed.
//!
//! Bad lines never stop a file and bad files never stop a run. Blank lines are
//! skipped and do not count towards a file's error rate.
//!
//! ## Example
//!
//! ```no_run
//! use memc_loader::{LoaderConfig, MemcacheStore, pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = LoaderConfig::builder()
//!     .pattern("/data/appsinstalled/*.tsv.gz")
//!     .dry_run(true)
//!     .build()?;
//! let summary = pipeline::run(&config, &MemcacheStore::new())?;
//! println!("{} files loaded", summary.files.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod gate;
pub mod io;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod record;
pub mod router;
pub mod store;
pub mod writer;

pub use config::LoaderConfig;
pub use gate::{FileStats, Verdict};
pub use parser::{LineOutcome, RejectReason, parse_line};
pub use pipeline::{FileReport, RunSummary};
pub use record::{AppsInstalled, UserApps};
pub use router::ShardTable;
pub use store::{FakeStore, MemcacheStore, ShardStore, StoreError};
