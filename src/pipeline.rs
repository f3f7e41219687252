//! The two-level ingestion pipeline.
//!
//! [`run`] discovers input files and hands them to `file_workers` threads
//! that claim one file at a time from a shared cursor. Each file gets its own
//! rayon pool of `line_workers` threads; lines are read in batches of
//! `batch_size` and every batch is mapped over that pool with an
//! order-preserving parallel map, so the outcome list of a file lines up with
//! its input lines. The line pool is only ever entered from a file thread,
//! never from another rayon pool, so neither level can run more work than its
//! thread count.
//!
//! A file is renamed only after every one of its lines has an outcome. Files
//! never wait on each other, and one file failing does not stop the others.

use crate::config::LoaderConfig;
use crate::gate::{self, FileStats, Verdict};
use crate::io::{compression::open_reader, glob::discover_files};
use crate::parser::{LineOutcome, parse_line};
use crate::store::ShardStore;
use crate::writer::insert_appsinstalled;
use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tracing::{error, info};

/// What happened to one input file.
#[derive(Clone, Debug, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub renamed_to: PathBuf,
    pub stats: FileStats,
    pub verdict: Option<Verdict>,
}

/// Reports for every file of a run, in discovery order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
}

impl RunSummary {
    /// Line counts summed over all files.
    #[must_use]
    pub fn totals(&self) -> FileStats {
        self.files.iter().fold(FileStats::default(), |mut acc, f| {
            acc.processed += f.stats.processed;
            acc.errors += f.stats.errors;
            acc.skipped += f.stats.skipped;
            acc
        })
    }
}

/// Parse, route and write a single line.
pub fn handle_line<S: ShardStore + ?Sized>(
    line: &str,
    config: &LoaderConfig,
    store: &S,
) -> LineOutcome {
    let record = match parse_line(line) {
        Ok(Some(record)) => record,
        Ok(None) => return LineOutcome::Skip,
        Err(reason) => {
            info!("Rejected line ({reason}): `{}`", line.trim());
            return LineOutcome::Error;
        }
    };

    let Some(addr) = config.shards.route(&record.dev_type) else {
        error!("Unknown device type: {}", record.dev_type);
        return LineOutcome::Error;
    };

    match insert_appsinstalled(store, addr, &record, config.dry_run) {
        Ok(()) => LineOutcome::Ok,
        Err(_) => LineOutcome::Error,
    }
}

/// Handle every line of `reader` on `pool`, returning outcomes in input order.
///
/// # Errors
///
/// Returns an error if reading the stream fails; outcomes gathered so far are
/// discarded.
pub fn process_lines<R: BufRead, S: ShardStore + ?Sized>(
    mut reader: R,
    config: &LoaderConfig,
    store: &S,
    pool: &ThreadPool,
) -> Result<Vec<LineOutcome>> {
    let mut outcomes = Vec::new();
    let mut batch = Vec::with_capacity(config.batch_size);
    loop {
        let more = read_batch(&mut reader, config.batch_size, &mut batch)?;
        if !batch.is_empty() {
            let done: Vec<LineOutcome> = pool.install(|| {
                batch
                    .par_iter()
                    .map(|line| handle_line(line, config, store))
                    .collect()
            });
            outcomes.extend(done);
        }
        if !more {
            return Ok(outcomes);
        }
    }
}

/// Refill `batch` with up to `limit` lines. Returns `false` at end of stream.
fn read_batch<R: BufRead>(reader: &mut R, limit: usize, batch: &mut Vec<String>) -> Result<bool> {
    batch.clear();
    let mut buf = Vec::new();
    while batch.len() < limit {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).context("read input line")? == 0 {
            return Ok(false);
        }
        batch.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(true)
}

fn line_pool(config: &LoaderConfig, path: &Path) -> Result<ThreadPool> {
    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ThreadPoolBuilder::new()
        .num_threads(config.line_workers)
        .thread_name(move |i| format!("lines-{stem}-{i}"))
        .build()
        .with_context(|| format!("build line pool for {}", path.display()))
}

/// Load one file end to end: lines, verdict, rename.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read, or cannot be renamed.
/// A file that fails to read is left under its original name.
pub fn process_file<S: ShardStore + ?Sized>(
    path: &Path,
    config: &LoaderConfig,
    store: &S,
) -> Result<FileReport> {
    info!("Processing {}", path.display());

    let pool = line_pool(config, path)?;
    let outcomes = {
        let reader = open_reader(path)?;
        process_lines(reader, config, store, &pool)
            .with_context(|| format!("load {}", path.display()))?
    };

    let (renamed_to, stats, verdict) = gate::complete_file(path, &outcomes, config.error_threshold)?;
    Ok(FileReport {
        path: path.to_path_buf(),
        renamed_to,
        stats,
        verdict,
    })
}

/// Load every file matching `config.pattern`.
///
/// All files are attempted. If any of them fails, the failures are logged and
/// the first one is returned once the others have finished.
///
/// # Errors
///
/// Returns an error for an invalid pattern, a worker that cannot be started,
/// or the first file that could not be loaded.
pub fn run<S: ShardStore + ?Sized>(config: &LoaderConfig, store: &S) -> Result<RunSummary> {
    let files = discover_files(&config.pattern)?;
    info!("Found {} file(s) matching {}", files.len(), config.pattern);

    let results = dispatch_files(&files, config, store)?;

    let mut summary = RunSummary::default();
    let mut first_error = None;
    for result in results {
        match result {
            Ok(report) => summary.files.push(report),
            Err(e) => {
                error!("{e:#}");
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    let totals = summary.totals();
    info!(
        "Loaded {} file(s): {} processed, {} errors, {} blank",
        summary.files.len(),
        totals.processed,
        totals.errors,
        totals.skipped
    );
    Ok(summary)
}

/// Run `process_file` over `files` on at most `config.file_workers` threads.
///
/// Each worker takes the next unclaimed index from a shared cursor and handles
/// one file at a time, so no more than `file_workers` files (and line pools)
/// are live at once. Results come back in the order of `files`.
fn dispatch_files<S: ShardStore + ?Sized>(
    files: &[PathBuf],
    config: &LoaderConfig,
    store: &S,
) -> Result<Vec<Result<FileReport>>> {
    let workers = config.file_workers.min(files.len());
    let next = AtomicUsize::new(0);

    thread::scope(|s| -> Result<Vec<Result<FileReport>>> {
        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let next = &next;
            let handle = thread::Builder::new()
                .name(format!("files-{i}"))
                .spawn_scoped(s, move || {
                    let mut done = Vec::new();
                    loop {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(path) = files.get(idx) else {
                            return done;
                        };
                        done.push((idx, process_file(path, config, store)));
                    }
                })
                .context("spawn file worker")?;
            handles.push(handle);
        }

        let mut slots: Vec<Option<Result<FileReport>>> = files.iter().map(|_| None).collect();
        for handle in handles {
            let done = handle
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            for (idx, result) in done {
                slots[idx] = Some(result);
            }
        }
        Ok(slots.into_iter().flatten().collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FakeStore;
    use std::io::Cursor;

    fn config() -> LoaderConfig {
        LoaderConfig::builder()
            .batch_size(3)
            .line_workers(4)
            .build()
            .unwrap()
    }

    fn pool() -> ThreadPool {
        ThreadPoolBuilder::new().num_threads(4).build().unwrap()
    }

    #[test]
    fn outcomes_follow_input_order_across_batches() {
        let input = "idfa\ta\t1\t2\t1\n\
                     \n\
                     nope\tb\t1\t2\t1\n\
                     gaid\tc\t1\t2\t1\n\
                     short\tline\n\
                     adid\td\t1\t2\t1\n\
                     dvid\te\t1\t2\t1";
        let store = FakeStore::new();
        let outcomes = process_lines(Cursor::new(input), &config(), &store, &pool()).unwrap();
        use LineOutcome::{Error, Ok as Done, Skip};
        assert_eq!(outcomes, vec![Done, Skip, Error, Done, Error, Done, Done]);
        assert_eq!(store.calls(), 4);
    }

    #[test]
    fn unknown_device_type_never_reaches_the_store() {
        let store = FakeStore::new();
        let outcome = handle_line("xxxx\tid\t1\t2\t1,2", &config(), &store);
        assert_eq!(outcome, LineOutcome::Error);
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn store_failure_only_affects_its_line() {
        let cfg = config();
        let store = FakeStore::new().failing_on(cfg.shards.route("gaid").unwrap());
        let input = "gaid\ta\t1\t2\t1\nidfa\tb\t1\t2\t1\n";
        let outcomes = process_lines(Cursor::new(input), &cfg, &store, &pool()).unwrap();
        assert_eq!(outcomes, vec![LineOutcome::Error, LineOutcome::Ok]);
    }

    #[test]
    fn empty_stream_has_no_outcomes() {
        let store = FakeStore::new();
        let outcomes = process_lines(Cursor::new(""), &config(), &store, &pool()).unwrap();
        assert!(outcomes.is_empty());
    }

    #[test]
    fn batch_boundary_at_exact_multiple() {
        let store = FakeStore::new();
        let input = "idfa\ta\t1\t2\t1\nidfa\tb\t1\t2\t1\nidfa\tc\t1\t2\t1\n";
        let outcomes = process_lines(Cursor::new(input), &config(), &store, &pool()).unwrap();
        assert_eq!(outcomes, vec![LineOutcome::Ok; 3]);
        assert_eq!(store.len("127.0.0.1:33013"), 3);
    }
}
