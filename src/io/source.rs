//! Input sources and output sinks.
//!
//! `DataSource` abstracts over standard input and local files and hands out
//! a buffered reader. Gzip-compressed files are detected by their magic
//! bytes and decompressed transparently; large plain files are memory-mapped
//! to cut read-path overhead.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use memmap2::Mmap;

use crate::error::Result;

/// File size above which plain local files are memory-mapped.
pub const MMAP_THRESHOLD: u64 = 50 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Where record bytes come from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Standard input
    Stdin,
    /// A local file path
    Local(PathBuf),
}

impl DataSource {
    /// Build a source from an optional CLI path argument; absent or `-`
    /// means standard input.
    pub fn from_arg(path: Option<&Path>) -> Self {
        match path {
            None => DataSource::Stdin,
            Some(p) if p.as_os_str() == "-" => DataSource::Stdin,
            Some(p) => DataSource::Local(p.to_path_buf()),
        }
    }

    /// Open the source as a buffered reader.
    ///
    /// Local files beginning with the gzip magic are decompressed on the
    /// fly; uncompressed files at or above [`MMAP_THRESHOLD`] are read
    /// through a memory map.
    pub fn open(&self) -> Result<Box<dyn BufRead>> {
        match self {
            DataSource::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
            DataSource::Local(path) => open_local(path),
        }
    }
}

fn open_local(path: &Path) -> Result<Box<dyn BufRead>> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let n = file.read(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;

    if n == 2 && magic == GZIP_MAGIC {
        return Ok(Box::new(BufReader::new(MultiGzDecoder::new(
            BufReader::new(file),
        ))));
    }

    if file.metadata()?.len() >= MMAP_THRESHOLD {
        let mmap = unsafe { Mmap::map(&file)? };
        return Ok(Box::new(BufReader::new(Cursor::new(mmap))));
    }

    Ok(Box::new(BufReader::new(file)))
}

/// Where formatted records go.
#[derive(Debug, Clone)]
pub enum DataSink {
    /// Standard output
    Stdout,
    /// A local file path
    Local(PathBuf),
}

impl DataSink {
    /// Build a sink from a CLI path argument; `-` means standard output.
    pub fn from_arg(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            DataSink::Stdout
        } else {
            DataSink::Local(path.to_path_buf())
        }
    }

    /// The sink's file extension, if any. Used for format detection.
    pub fn extension(&self) -> Option<&str> {
        match self {
            DataSink::Local(path) => path.extension().and_then(|s| s.to_str()),
            DataSink::Stdout => None,
        }
    }

    /// Create the sink as a plain writer. Callers buffer and flush.
    pub fn create(&self) -> Result<Box<dyn Write>> {
        match self {
            DataSink::Stdout => Ok(Box::new(io::stdout())),
            DataSink::Local(path) => Ok(Box::new(File::create(path)?)),
        }
    }
}
