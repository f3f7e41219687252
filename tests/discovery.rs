//! Input discovery over real directories.

use anyhow::Result;
use memc_loader::io::glob::discover_files;
use std::fs::{File, create_dir_all};
use tempfile::TempDir;

#[test]
fn matches_are_sorted_files_only() -> Result<()> {
    let dir = TempDir::new()?;
    let base = dir.path();
    File::create(base.join("b.tsv.gz"))?;
    File::create(base.join("a.tsv.gz"))?;
    File::create(base.join("c.tsv"))?;
    create_dir_all(base.join("d.tsv.gz"))?;

    let files = discover_files(&format!("{}/*.tsv.gz", base.display()))?;
    assert_eq!(files, vec![base.join("a.tsv.gz"), base.join("b.tsv.gz")]);
    Ok(())
}

#[test]
fn consumed_files_are_not_matched() -> Result<()> {
    let dir = TempDir::new()?;
    let base = dir.path();
    File::create(base.join(".done.tsv.gz"))?;
    File::create(base.join("todo.tsv.gz"))?;

    let files = discover_files(&format!("{}/*.tsv.gz", base.display()))?;
    assert_eq!(files, vec![base.join("todo.tsv.gz")]);

    let all = discover_files(&format!("{}/*", base.display()))?;
    assert_eq!(all, vec![base.join("todo.tsv.gz")]);
    Ok(())
}

#[test]
fn no_match_is_empty() -> Result<()> {
    let dir = TempDir::new()?;
    assert!(discover_files(&format!("{}/*.tsv.gz", dir.path().display()))?.is_empty());
    Ok(())
}

#[test]
fn invalid_pattern_is_an_error() {
    let err = discover_files("/data/[unclosed").unwrap_err();
    assert!(err.to_string().contains("invalid glob pattern"));
}
