//! Reading plain and compressed inputs through `open_reader`.

use anyhow::Result;
use memc_loader::io::compression::{create_writer, open_reader};
use std::io::{BufRead, Write};
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, text: &str) -> Result<()> {
    let mut w = create_writer(path)?;
    w.write_all(text.as_bytes())?;
    w.flush()?;
    Ok(())
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    Ok(open_reader(path)?.lines().collect::<std::io::Result<_>>()?)
}

const TEXT: &str = "idfa\ta\t1\t2\t3\ngaid\tb\t4\t5\t6\n";

#[test]
fn plain_text_passes_through() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("plain.tsv");
    write(&path, TEXT)?;
    assert_eq!(read_lines(&path)?, vec!["idfa\ta\t1\t2\t3", "gaid\tb\t4\t5\t6"]);
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzip_by_extension_and_by_magic() -> Result<()> {
    let dir = TempDir::new()?;
    let gz = dir.path().join("data.tsv.gz");
    write(&gz, TEXT)?;
    assert_ne!(std::fs::read(&gz)?, TEXT.as_bytes());
    assert_eq!(read_lines(&gz)?.len(), 2);

    let renamed = dir.path().join("data.tsv");
    std::fs::rename(&gz, &renamed)?;
    assert_eq!(read_lines(&renamed)?, vec!["idfa\ta\t1\t2\t3", "gaid\tb\t4\t5\t6"]);
    Ok(())
}

#[cfg(feature = "compression-zstd")]
#[test]
fn zstd_by_extension() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("data.tsv.zst");
    write(&path, TEXT)?;
    assert_eq!(read_lines(&path)?.len(), 2);
    Ok(())
}

#[test]
fn missing_file_names_the_path() {
    let err = open_reader(Path::new("/nonexistent/in.tsv.gz")).err().unwrap();
    assert!(format!("{err:#}").contains("/nonexistent/in.tsv.gz"));
}
