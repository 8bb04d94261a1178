//! Archive format dispatch and extraction.
//!
//! `.tar.gz` and `.zip` are unpacked natively on a blocking thread; `.tar.xz`
//! is streamed through a [`Decompressor`] into a [`TarSink`].

mod decompress;
mod extract;
mod format;

pub use decompress::{stream_unpack, Decompressor, TarSink, UnpackSink, XzDecompressor};
pub use extract::ArchiveExtractor;
pub use format::ArchiveFormat;
