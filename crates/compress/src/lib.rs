//! Decompression of the offline index feeds found on a CPAN mirror.
//!
//! Mirror feeds (`02packages.details.txt.gz`, `indices/find-ls.gz`, ...) are
//! either plain text or compressed with Gzip or Bzip2. This crate wraps both
//! libraries behind a single [`Compression`] enum. Feeds are read line by line
//! with [`open_lines`], which picks the format from the file's magic bytes
//! ([`Compression::from_magic_bytes`]) rather than its name.

pub mod error;
mod lines;
mod ops;
mod util;

pub use crate::lines::{FeedLines, open_lines};

/// A supported compression format. Defaults to [`None`](Self::None).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed
    #[default]
    None,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// Gzip compression (.gz)
    Gzip,
}

#[cfg(test)]
mod tests {
    use crate::Compression;

    #[test]
    fn compression_default() {
        assert_eq!(Compression::default(), Compression::None);
    }
}
