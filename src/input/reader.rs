use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::input::InputError;

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    if !path.exists() {
        return Err(InputError::MissingInput(path.display().to_string()));
    }
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Buffered writer; gzip-compressed when `gzip` is set.
pub fn create_writer(path: &Path, gzip: bool) -> std::io::Result<Box<dyn Write>> {
    let file = File::create(path)?;
    if gzip {
        Ok(Box::new(BufWriter::new(GzEncoder::new(
            file,
            Compression::default(),
        ))))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Reads the next non-blank line into `buf`, line terminator stripped.
/// Returns `false` at end of input.
pub fn next_line(
    reader: &mut dyn BufRead,
    buf: &mut String,
    line_no: &mut usize,
) -> Result<bool, InputError> {
    loop {
        buf.clear();
        let read = reader.read_line(buf)?;
        if read == 0 {
            return Ok(false);
        }
        *line_no += 1;
        let trimmed_len = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed_len);
        if !buf.trim().is_empty() {
            return Ok(true);
        }
    }
}
