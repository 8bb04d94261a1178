//! Streaming decompression into an unpacking sink.
//!
//! The `tar` crate reads plain tar streams only, so compressed tarballs whose
//! codec is not handled natively go through [`stream_unpack`]:
//!
//! ```text
//! archive file -> Decompressor::transform -> pipe -> UnpackSink (blocking task)
//! ```
//!
//! [`stream_unpack`] returns only once the sink has finished. The decompressor
//! reaching end of stream says nothing about whether the sink has written out
//! every entry yet.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use async_compression::tokio::bufread::XzDecoder;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWriteExt, BufReader};
use tokio_util::io::SyncIoBridge;

use crate::{ArchiveError, Result};

const PIPE_CAPACITY: usize = 64 * 1024;

/// A byte stream transform that turns compressed input into decompressed output.
pub trait Decompressor: Send + Sync {
    fn transform<'a>(
        &self,
        input: Box<dyn AsyncBufRead + Send + Unpin + 'a>,
    ) -> Box<dyn AsyncRead + Send + Unpin + 'a>;
}

/// xz / LZMA2 codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct XzDecompressor;

impl Decompressor for XzDecompressor {
    fn transform<'a>(
        &self,
        input: Box<dyn AsyncBufRead + Send + Unpin + 'a>,
    ) -> Box<dyn AsyncRead + Send + Unpin + 'a> {
        let mut decoder = XzDecoder::new(input);
        decoder.multiple_members(true);
        Box::new(decoder)
    }
}

/// Consumer of a decompressed archive stream. Runs on a blocking thread.
pub trait UnpackSink: Send + 'static {
    fn unpack<R: Read>(self, reader: R) -> io::Result<()>;
}

/// Unpacks a plain tar stream into a directory.
#[derive(Debug, Clone)]
pub struct TarSink {
    dest: PathBuf,
}

impl TarSink {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }
}

impl UnpackSink for TarSink {
    fn unpack<R: Read>(self, reader: R) -> io::Result<()> {
        tar::Archive::new(reader).unpack(&self.dest)
    }
}

/// Pipe `archive` through `decompressor` into `sink`.
///
/// Completes after both ends are done, and reports the decompression error
/// first when both fail since the sink usually only sees its fallout.
pub async fn stream_unpack<D, S>(archive: &Path, decompressor: &D, sink: S) -> Result<()>
where
    D: Decompressor + ?Sized,
    S: UnpackSink,
{
    let file = tokio::fs::File::open(archive).await?;
    let mut decoded = decompressor.transform(Box::new(BufReader::new(file)));

    let (writer, reader) = tokio::io::duplex(PIPE_CAPACITY);
    let mut bridge = SyncIoBridge::new(reader);

    let sink_task = tokio::task::spawn_blocking(move || {
        sink.unpack(&mut bridge)?;
        // Consume trailing padding so the source never blocks on a full pipe.
        io::copy(&mut bridge, &mut io::sink())?;
        Ok::<(), io::Error>(())
    });

    let source = async move {
        let mut writer = writer;
        let copied = tokio::io::copy(&mut decoded, &mut writer).await?;
        writer.shutdown().await?;
        Ok::<u64, io::Error>(copied)
    }
    .await;

    let sink = sink_task
        .await
        .map_err(|e| ArchiveError::Extraction(format!("Unpack task failed: {}", e)))?;

    match (source, sink) {
        (Ok(bytes), Ok(())) => {
            log::debug!("Unpacked {} decompressed bytes from {}", bytes, archive.display());
            Ok(())
        }
        (Err(e), _) if e.kind() != io::ErrorKind::BrokenPipe => Err(ArchiveError::Extraction(
            format!("Failed to decompress {}: {}", archive.display(), e),
        )),
        (_, Err(e)) => Err(ArchiveError::Extraction(format!(
            "Failed to unpack {}: {}",
            archive.display(),
            e
        ))),
        (Err(e), Ok(())) => Err(ArchiveError::Extraction(format!(
            "Failed to decompress {}: {}",
            archive.display(),
            e
        ))),
    }
}
