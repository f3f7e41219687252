//! Transparent decompression of input files.
//!
//! The codec is picked from the file extension first and from the stream's
//! magic bytes second; anything unrecognised is read as plain text. Codecs are
//! compiled in through the `compression-*` features.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Compression formats the loader can read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    Gzip,
    Zstd,
    Bzip2,
    Xz,
}

impl Codec {
    /// Codecs available in this build.
    #[must_use]
    pub fn enabled() -> &'static [Codec] {
        &[
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip,
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd,
            #[cfg(feature = "compression-bzip2")]
            Codec::Bzip2,
            #[cfg(feature = "compression-xz")]
            Codec::Xz,
        ]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Codec::Gzip => "gzip",
            Codec::Zstd => "zstd",
            Codec::Bzip2 => "bzip2",
            Codec::Xz => "xz",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            Codec::Gzip => &[".gz", ".gzip"],
            Codec::Zstd => &[".zst", ".zstd"],
            Codec::Bzip2 => &[".bz2", ".bzip2"],
            Codec::Xz => &[".xz"],
        }
    }

    fn magic_bytes(self) -> &'static [u8] {
        match self {
            Codec::Gzip => &[0x1f, 0x8b],
            Codec::Zstd => &[0x28, 0xb5, 0x2f, 0xfd],
            Codec::Bzip2 => &[0x42, 0x5a, 0x68],
            Codec::Xz => &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00],
        }
    }

    /// Codec for `path` by extension, case-insensitively.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Codec> {
        let name = path.to_string_lossy().to_lowercase();
        Self::enabled()
            .iter()
            .copied()
            .find(|c| c.extensions().iter().any(|ext| name.ends_with(ext)))
    }

    /// Codec whose signature starts `head`.
    #[must_use]
    pub fn from_magic(head: &[u8]) -> Option<Codec> {
        Self::enabled()
            .iter()
            .copied()
            .find(|c| head.starts_with(c.magic_bytes()))
    }

    #[allow(unused_variables, unreachable_code)]
    fn decoder(self, reader: Box<dyn Read + Send>) -> std::io::Result<Box<dyn Read + Send>> {
        let decoded: Box<dyn Read + Send> = match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
            #[cfg(feature = "compression-bzip2")]
            Codec::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            #[cfg(feature = "compression-xz")]
            Codec::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
            #[allow(unreachable_patterns)]
            other => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    format!("{} support not compiled in", other.name()),
                ));
            }
        };
        Ok(decoded)
    }

    #[allow(unused_variables, unreachable_code)]
    fn encoder(self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        let encoded: Box<dyn Write> = match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => Box::new(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::default(),
            )),
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => Box::new(zstd::stream::write::Encoder::new(writer, 3)?.auto_finish()),
            #[cfg(feature = "compression-bzip2")]
            Codec::Bzip2 => Box::new(bzip2::write::BzEncoder::new(
                writer,
                bzip2::Compression::default(),
            )),
            #[cfg(feature = "compression-xz")]
            Codec::Xz => Box::new(xz2::write::XzEncoder::new(writer, 6)),
            #[allow(unreachable_patterns)]
            other => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    format!("{} support not compiled in", other.name()),
                ));
            }
        };
        Ok(encoded)
    }
}

/// Open `path` for line reading, decompressing when needed.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the decoder cannot start.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;

    if let Some(codec) = Codec::from_path(path) {
        let inner = codec
            .decoder(Box::new(file))
            .with_context(|| format!("wrap {} with {} codec", path.display(), codec.name()))?;
        return Ok(Box::new(BufReader::new(inner)));
    }

    let mut buffered = BufReader::new(file);
    let head = buffered
        .fill_buf()
        .with_context(|| format!("read {}", path.display()))?;
    if let Some(codec) = Codec::from_magic(head) {
        let inner = codec
            .decoder(Box::new(buffered))
            .with_context(|| format!("wrap {} with {} codec", path.display(), codec.name()))?;
        return Ok(Box::new(BufReader::new(inner)));
    }

    Ok(Box::new(buffered))
}

/// Create `path` for writing, compressing by extension.
///
/// Used to produce fixtures. Dropping the writer finishes the stream.
///
/// # Errors
///
/// Returns an error if the file cannot be created or the encoder cannot start.
pub fn create_writer(path: &Path) -> Result<Box<dyn Write>> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    match Codec::from_path(path) {
        Some(codec) => codec
            .encoder(Box::new(BufWriter::new(file)))
            .with_context(|| format!("wrap {} with {} codec", path.display(), codec.name())),
        None => Ok(Box::new(BufWriter::new(file))),
    }
}
