use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;

/// Upper bound on the number of cells a parsed mask may declare.
const MAX_MASK_CELLS: u64 = 1 << 24;

/// Two-dimensional validity grid restricting where passages and rooms may go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

/// Failures raised while reading a mask from its text form.
#[derive(Debug, Error)]
pub enum MaskError {
    /// The mask file could not be read.
    #[error("failed to read mask file {}", .path.display())]
    Io {
        /// Location that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The source contained no `<width>,<height>` line.
    #[error("mask source is missing its `<width>,<height>` header")]
    MissingHeader,
    /// The header line could not be parsed as two dimensions.
    #[error("malformed mask header `{0}`")]
    MalformedHeader(String),
    /// The header declared more cells than a mask may hold.
    #[error("mask of {width}x{height} cells exceeds the supported size")]
    TooLarge {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },
}

impl Default for Mask {
    fn default() -> Self {
        Self::empty()
    }
}

impl Mask {
    /// Creates a mask of the given size where every cell is valid.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, true)
    }

    /// Creates a zero-sized mask, signalling "no playable area".
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
        }
    }

    fn filled(width: u32, height: u32, value: bool) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![value; capacity],
        }
    }

    /// Parses the text form: a `<width>,<height>` header followed by one row
    /// per line where `'1'` marks a valid cell.
    ///
    /// Rows are whitespace separated; short or missing rows leave the
    /// remaining cells invalid.
    pub fn parse(source: &str) -> Result<Self, MaskError> {
        let mut rows = source.split_whitespace();
        let header = rows.next().ok_or(MaskError::MissingHeader)?;
        let (width, height) = parse_header(header)?;

        let mut mask = Self::filled(width, height, false);
        let row_count = usize::try_from(height).unwrap_or(usize::MAX);
        let column_count = usize::try_from(width).unwrap_or(usize::MAX);
        for (row, line) in rows.take(row_count).enumerate() {
            for (column, symbol) in line.chars().take(column_count).enumerate() {
                if symbol != '1' {
                    continue;
                }
                if let Some(index) = mask.index_usize(column, row) {
                    mask.cells[index] = true;
                }
            }
        }

        Ok(mask)
    }

    /// Reads and parses a mask file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MaskError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| MaskError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Reads a mask file, falling back to an empty mask on any failure.
    ///
    /// Callers must check [`Mask::is_empty`] before generating from the result.
    #[must_use]
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(mask) => mask,
            Err(error) => {
                warn!(%error, "mask unavailable, continuing with an empty mask");
                Self::empty()
            }
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the mask has no cells at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Reports whether `(x, y)` lies inside the playable area.
    ///
    /// Coordinates outside the mask are never valid.
    #[must_use]
    pub fn valid(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (Ok(column), Ok(row)) = (usize::try_from(x), usize::try_from(y)) else {
            return false;
        };
        self.index_usize(column, row)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(false)
    }

    /// Number of valid cells.
    #[must_use]
    pub fn valid_count(&self) -> u64 {
        self.cells.iter().filter(|cell| **cell).count() as u64
    }

    fn index_usize(&self, column: usize, row: usize) -> Option<usize> {
        let width = usize::try_from(self.width).ok()?;
        let height = usize::try_from(self.height).ok()?;
        if column < width && row < height {
            Some(row * width + column)
        } else {
            None
        }
    }
}

fn parse_header(header: &str) -> Result<(u32, u32), MaskError> {
    let malformed = || MaskError::MalformedHeader(header.to_owned());
    let (width, height) = header.split_once(',').ok_or_else(malformed)?;
    let width: u32 = width.trim().parse().map_err(|_| malformed())?;
    let height: u32 = height.trim().parse().map_err(|_| malformed())?;

    if u64::from(width) * u64::from(height) > MAX_MASK_CELLS {
        return Err(MaskError::TooLarge { width, height });
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_mask_is_fully_valid() {
        let mask = Mask::new(3, 2);
        assert_eq!(mask.valid_count(), 6);
        assert!(mask.valid(2, 1));
        assert!(!mask.valid(3, 0));
        assert!(!mask.valid(0, 2));
    }

    #[test]
    fn parse_reads_rows_and_ignores_other_symbols() {
        let mask = Mask::parse("3,2\n101\n0x1\n").expect("valid mask");

        assert_eq!((mask.width(), mask.height()), (3, 2));
        assert!(mask.valid(0, 0));
        assert!(!mask.valid(1, 0));
        assert!(mask.valid(2, 0));
        assert!(!mask.valid(1, 1));
        assert!(mask.valid(2, 1));
        assert_eq!(mask.valid_count(), 3);
    }

    #[test]
    fn short_and_missing_rows_stay_invalid() {
        let mask = Mask::parse("4,3\n11\n\n").expect("valid mask");

        assert!(mask.valid(0, 0));
        assert!(mask.valid(1, 0));
        assert!(!mask.valid(2, 0));
        assert!(!mask.valid(0, 1));
        assert!(!mask.valid(0, 2));
    }

    #[test]
    fn extra_rows_and_columns_are_ignored() {
        let mask = Mask::parse("2,1\n1111\n1111").expect("valid mask");
        assert_eq!(mask.valid_count(), 2);
    }

    #[test]
    fn header_errors_are_reported() {
        assert!(matches!(Mask::parse("   \n"), Err(MaskError::MissingHeader)));
        assert!(matches!(
            Mask::parse("abc\n111"),
            Err(MaskError::MalformedHeader(_))
        ));
        assert!(matches!(
            Mask::parse("3;3\n111"),
            Err(MaskError::MalformedHeader(_))
        ));
        assert!(matches!(
            Mask::parse("100000,100000"),
            Err(MaskError::TooLarge { .. })
        ));
    }

    #[test]
    fn missing_file_yields_empty_mask() {
        let mask = Mask::load_or_empty("/definitely/not/a/mask.txt");
        assert!(mask.is_empty());
        assert_eq!(mask.valid_count(), 0);
        assert!(!mask.valid(0, 0));
    }

    #[test]
    fn clone_is_independent_copy() {
        let original = Mask::parse("2,2\n10\n01").expect("valid mask");
        let copy = original.clone();
        assert_eq!(copy, original);
    }
}
