//! Bounded buffered reading and raw line counting.
//!
//! The line counter never parses fields; it only scans for `\n` through a
//! buffer of fixed capacity, so counting a file of any size uses constant memory.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read-buffer capacity used when scanning whole files.
pub const SCAN_BUFFER_BYTES: usize = 64 * 1024;

/// Open `path` behind a `BufReader` with a fixed capacity.
pub fn bounded_from_path<P: AsRef<Path>>(path: P, cap: usize) -> io::Result<BufReader<File>> {
    let file = File::open(path)?;
    Ok(BufReader::with_capacity(cap, file))
}

/// Count lines the way a line iterator would: every `\n` ends a line, and a
/// trailing fragment without `\n` is one more line.
pub fn count_lines<R: BufRead>(mut reader: R) -> io::Result<u64> {
    let mut lines = 0u64;
    let mut last = None;
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        lines += buf.iter().filter(|&&b| b == b'\n').count() as u64;
        last = buf.last().copied();
        let n = buf.len();
        reader.consume(n);
    }
    if matches!(last, Some(b) if b != b'\n') {
        lines += 1;
    }
    Ok(lines)
}
