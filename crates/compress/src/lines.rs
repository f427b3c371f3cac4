//! Line-oriented reading of (possibly compressed) feed files.

use crate::Compression;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;

const MAGIC_PEEK_BYTES: u64 = 3;

/// Iterator over the lines of a feed file, decompressed on the fly.
///
/// Line terminators are stripped. Lines that are not valid UTF-8 are decoded
/// lossily; mirror listings occasionally contain Latin-1 filenames and those
/// are expected, so they're only reported at `trace` level.
pub struct FeedLines {
    reader: BufReader<Box<dyn Read>>,
    buffer: Vec<u8>,
    line: u64,
}

/// Open a feed file, detecting its compression from the leading magic bytes
/// (the extension is not trusted; mirrors serve `.gz` feeds uncompressed more
/// often than you'd think).
///
/// Returns [`ErrorKind::NotFound`] when the file is absent so callers can
/// decide whether a missing feed is fatal.
pub fn open_lines(path: impl AsRef<Path>) -> Result<FeedLines> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => exn::Exn::from(ErrorKind::NotFound(path.to_path_buf())),
        _ => exn::Exn::from(e).raise(ErrorKind::Io),
    })?;
    let mut head = Vec::new();
    (&mut file).take(MAGIC_PEEK_BYTES).read_to_end(&mut head).or_raise(|| ErrorKind::Io)?;
    let compression = Compression::from_magic_bytes(&head);
    tracing::debug!(path = %path.display(), format = %compression, "Opening feed");
    let raw: Box<dyn Read> = Box::new(Cursor::new(head).chain(file));
    Ok(FeedLines {
        reader: BufReader::new(compression.wrap_reader(raw)),
        buffer: Vec::new(),
        line: 0,
    })
}

impl Iterator for FeedLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                self.line += 1;
                while matches!(self.buffer.last(), Some(b'\n' | b'\r')) {
                    self.buffer.pop();
                }
                let line = match std::str::from_utf8(&self.buffer) {
                    Ok(s) => s.to_string(),
                    Err(_) => {
                        tracing::trace!(line = self.line, "Feed line is not valid UTF-8; decoding lossily");
                        String::from_utf8_lossy(&self.buffer).into_owned()
                    },
                };
                Some(Ok(line))
            },
            Err(e) => Some(Err(exn::Exn::from(e).raise(ErrorKind::InvalidData))),
        }
    }
}
