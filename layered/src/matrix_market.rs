//! Matrix Market coordinate reader
//!
//! Supports `%%MatrixMarket matrix coordinate <field> general` with an
//! `integer`, `real` or `double` field. The reader borrows its input, so
//! re-creating it for the second pass costs nothing.

use crate::config::LayeredConfig;
use crate::layered_matrix::LayeredMatrix;
use crate::triplets::read_layered_sparse;
use layered_core::{
    FieldType, LayeredError, MatrixElement, Preamble, Result, Scalar, TripletSource,
};
#[cfg(feature = "mmap")]
use memmap2::MmapOptions;
use std::num::IntErrorKind;
#[cfg(feature = "mmap")]
use std::{fs::File, path::Path};

const BANNER: &str = "%%matrixmarket";

/// Streaming reader over the text of a Matrix Market file
#[derive(Debug, Clone)]
pub struct MatrixMarketReader<'a> {
    text: &'a [u8],
    /// Byte position of the first entry line, once the preamble is read
    body: usize,
    preamble: Option<Preamble>,
}

/// Split off the next line, returning it with the position after it
fn next_line(text: &[u8], position: usize) -> Option<(&[u8], usize)> {
    if position >= text.len() {
        return None;
    }
    let rest = &text[position..];
    let (line, advance) = match rest.iter().position(|&b| b == b'\n') {
        Some(end) => (&rest[..end], end + 1),
        None => (rest, rest.len()),
    };
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    Some((line, position + advance))
}

fn as_text(line: &[u8]) -> Result<&str> {
    std::str::from_utf8(line).map_err(|_| LayeredError::MalformedInput("input is not valid UTF-8"))
}

fn parse_field(token: &str) -> Result<FieldType> {
    match token.to_ascii_lowercase().as_str() {
        "integer" => Ok(FieldType::Integer),
        "real" => Ok(FieldType::Real),
        "double" => Ok(FieldType::Double),
        "complex" => Ok(FieldType::Complex),
        "pattern" => Ok(FieldType::Pattern),
        _ => Err(LayeredError::MalformedInput("unknown field in banner")),
    }
}

fn parse_index(token: Option<&str>) -> Result<usize> {
    token
        .ok_or(LayeredError::MalformedInput("missing index"))?
        .parse()
        .map_err(|_| LayeredError::MalformedInput("index is not a non-negative integer"))
}

/// Integers past the `i64` range are still numbers, so they surface as
/// value errors rather than malformed input.
fn parse_integer(token: &str) -> Result<i64> {
    token.parse().map_err(|e: std::num::ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow => LayeredError::ValueOutOfRange,
        IntErrorKind::NegOverflow => LayeredError::NegativeValue,
        _ => LayeredError::MalformedInput("value is not an integer"),
    })
}

impl<'a> MatrixMarketReader<'a> {
    pub fn new(text: &'a [u8]) -> Self {
        Self {
            text,
            body: 0,
            preamble: None,
        }
    }

    fn read_preamble(&self) -> Result<(Preamble, usize)> {
        let (banner, mut position) =
            next_line(self.text, 0).ok_or(LayeredError::MalformedInput("empty input"))?;
        let banner = as_text(banner)?;
        let mut tokens = banner.split_whitespace();
        match tokens.next() {
            Some(first) if first.eq_ignore_ascii_case(BANNER) => {}
            _ => return Err(LayeredError::MalformedInput("missing %%MatrixMarket banner")),
        }

        let object = tokens.next().unwrap_or_default();
        let format = tokens.next().unwrap_or_default();
        if !object.eq_ignore_ascii_case("matrix") {
            return Err(LayeredError::MalformedInput("only matrix objects are supported"));
        }
        if !format.eq_ignore_ascii_case("coordinate") {
            return Err(LayeredError::MalformedInput("only coordinate format is supported"));
        }
        let field = parse_field(tokens.next().unwrap_or_default())?;
        let symmetry = tokens.next().unwrap_or_default();
        if !symmetry.eq_ignore_ascii_case("general") {
            return Err(LayeredError::MalformedInput("only general symmetry is supported"));
        }

        // Comments and blank lines may precede the size line.
        loop {
            let (line, next) = next_line(self.text, position)
                .ok_or(LayeredError::MalformedInput("missing size line"))?;
            position = next;
            let line = as_text(line)?.trim();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }

            let mut sizes = line.split_whitespace();
            let nrow = parse_index(sizes.next())?;
            let ncol = parse_index(sizes.next())?;
            let nnz = parse_index(sizes.next())?;
            if sizes.next().is_some() {
                return Err(LayeredError::MalformedInput("size line has extra fields"));
            }
            let preamble = Preamble {
                nrow,
                ncol,
                nnz,
                field,
            };
            return Ok((preamble, position));
        }
    }
}

impl TripletSource for MatrixMarketReader<'_> {
    fn preamble(&mut self) -> Result<Preamble> {
        if let Some(preamble) = self.preamble {
            return Ok(preamble);
        }
        let (preamble, body) = self.read_preamble()?;
        self.preamble = Some(preamble);
        self.body = body;
        Ok(preamble)
    }

    fn scan<F>(&mut self, mut handler: F) -> Result<()>
    where
        F: FnMut(usize, usize, Scalar) -> Result<()>,
    {
        let preamble = self.preamble()?;
        if !preamble.field.is_numeric() {
            return Err(LayeredError::UnsupportedField);
        }

        let mut position = self.body;
        let mut seen = 0;
        while let Some((line, next)) = next_line(self.text, position) {
            position = next;
            let line = as_text(line)?.trim();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let row = parse_index(tokens.next())?;
            let column = parse_index(tokens.next())?;
            let token = tokens
                .next()
                .ok_or(LayeredError::MalformedInput("missing value"))?;
            let value = match preamble.field {
                FieldType::Integer => Scalar::Integer(parse_integer(token)?),
                _ => Scalar::Real(
                    token
                        .parse()
                        .map_err(|_| LayeredError::MalformedInput("value is not a number"))?,
                ),
            };

            seen += 1;
            if seen > preamble.nnz {
                return Err(LayeredError::MalformedInput("more entries than the size line declares"));
            }
            handler(row, column, value)?;
        }

        if seen != preamble.nnz {
            return Err(LayeredError::MalformedInput("fewer entries than the size line declares"));
        }
        Ok(())
    }
}

/// Build a layered matrix from Matrix Market text held in memory
pub fn read_layered_sparse_from_matrix_market_buffer<T: MatrixElement>(
    bytes: &[u8],
    config: &LayeredConfig,
) -> Result<LayeredMatrix<T>> {
    read_layered_sparse(|| Ok(MatrixMarketReader::new(bytes)), config)
}

/// Build a layered matrix from a Matrix Market file, mapped into memory
#[cfg(feature = "mmap")]
pub fn read_layered_sparse_from_matrix_market_file<T, P>(
    path: P,
    config: &LayeredConfig,
) -> Result<LayeredMatrix<T>>
where
    T: MatrixElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        log::error!("failed to open {}: {e}", path.display());
        LayeredError::Io("failed to open file")
    })?;
    let length = file
        .metadata()
        .map_err(|_| LayeredError::Io("failed to read file metadata"))?
        .len();
    if length == 0 {
        return read_layered_sparse_from_matrix_market_buffer(&[], config);
    }

    // SAFETY: the mapping is read-only and dropped before this function
    // returns. Modifying the file while it is mapped is not supported.
    let mmap = unsafe {
        MmapOptions::new().map(&file).map_err(|e| {
            log::error!("failed to map {}: {e}", path.display());
            LayeredError::Io("failed to memory map file")
        })?
    };
    log::debug!("mapped {} ({} bytes)", path.display(), mmap.len());
    read_layered_sparse_from_matrix_market_buffer(&mmap, config)
}
