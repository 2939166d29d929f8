//! Source locations with a compact field layout.
//!
//! A location is a URI plus optional position fields: an offset/length pair
//! and, optionally, begin/end line and column. At construction the narrowest
//! [`Layout`] able to hold every supplied field is selected, from an ordered
//! list of candidates. Equality and hashing look only at the logical fields,
//! never at the layout.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::Error;

/// Storage layout of a location's position fields.
///
/// `Offsets*` layouts hold offset and length only. `Full*` layouts also hold
/// lines and columns; the number gives the width in bits of offset, length and
/// lines, and `Cols8` marks 8-bit columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Layout {
    /// URI only, no position fields.
    UriOnly,
    /// 8-bit offset and length.
    Offsets8,
    /// 16-bit offset and length.
    Offsets16,
    /// 32-bit offset and length.
    Offsets32,
    /// Every field 8-bit.
    Full8,
    /// 16-bit offset, length, and lines; 8-bit columns.
    Full16Cols8,
    /// Every field 16-bit.
    Full16,
    /// 32-bit offset, length, and lines; 8-bit columns.
    Full32Cols8,
    /// Every field 32-bit.
    Full32,
}

impl Layout {
    /// Offset/length candidates, narrowest first.
    const OFFSET_CANDIDATES: [Self; 3] = [Self::Offsets8, Self::Offsets16, Self::Offsets32];

    /// Line/column candidates, narrowest first.
    const FULL_CANDIDATES: [Self; 5] = [
        Self::Full8,
        Self::Full16Cols8,
        Self::Full16,
        Self::Full32Cols8,
        Self::Full32,
    ];

    /// Returns true if the layout stores offset and length.
    #[must_use]
    pub const fn has_offset_length(self) -> bool {
        !matches!(self, Self::UriOnly)
    }

    /// Returns true if the layout stores lines and columns.
    #[must_use]
    pub const fn has_line_column(self) -> bool {
        matches!(
            self,
            Self::Full8 | Self::Full16Cols8 | Self::Full16 | Self::Full32Cols8 | Self::Full32
        )
    }
}

/// Validated logical line/column fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Lines {
    begin_line: u32,
    end_line: u32,
    begin_column: u32,
    end_column: u32,
}

/// Validated logical position fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Fields {
    offset: u32,
    length: u32,
    lines: Option<Lines>,
}

fn checked(name: &str, value: i64) -> Result<u32> {
    if value < 0 {
        return Err(Error::invalid_argument(format!(
            "{name} must be non-negative, got {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| Error::invalid_argument(format!("{name} {value} exceeds {}", u32::MAX)))
}

impl Lines {
    fn validate(begin_line: i64, end_line: i64, begin_column: i64, end_column: i64) -> Result<Self> {
        let lines = Self {
            begin_line: checked("begin line", begin_line)?,
            end_line: checked("end line", end_line)?,
            begin_column: checked("begin column", begin_column)?,
            end_column: checked("end column", end_column)?,
        };
        if lines.end_line < lines.begin_line {
            return Err(Error::invalid_argument(format!(
                "end line {end_line} precedes begin line {begin_line}"
            )));
        }
        if lines.end_line == lines.begin_line && lines.end_column < lines.begin_column {
            return Err(Error::invalid_argument(format!(
                "end column {end_column} precedes begin column {begin_column} on line {begin_line}"
            )));
        }
        Ok(lines)
    }
}

fn narrow<T: TryFrom<u32>>(value: u32) -> Option<T> {
    T::try_from(value).ok()
}

fn pair<T: TryFrom<u32>>(a: u32, b: u32) -> Option<[T; 2]> {
    Some([narrow(a)?, narrow(b)?])
}

/// Position fields stored at the width of the selected layout.
#[derive(Clone, Copy, Debug)]
enum Positions {
    None,
    Offsets8 {
        offset: u8,
        length: u8,
    },
    Offsets16 {
        offset: u16,
        length: u16,
    },
    Offsets32 {
        offset: u32,
        length: u32,
    },
    Full8 {
        offset: u8,
        length: u8,
        lines: [u8; 2],
        columns: [u8; 2],
    },
    Full16Cols8 {
        offset: u16,
        length: u16,
        lines: [u16; 2],
        columns: [u8; 2],
    },
    Full16 {
        offset: u16,
        length: u16,
        lines: [u16; 2],
        columns: [u16; 2],
    },
    Full32Cols8 {
        offset: u32,
        length: u32,
        lines: [u32; 2],
        columns: [u8; 2],
    },
    Full32 {
        offset: u32,
        length: u32,
        lines: [u32; 2],
        columns: [u32; 2],
    },
}

impl Positions {
    /// Stores the fields in `layout`, or `None` if they do not fit it.
    fn encode(layout: Layout, fields: Fields) -> Option<Self> {
        let Fields {
            offset, length, lines,
        } = fields;
        match (layout, lines) {
            (Layout::Offsets8, None) => Some(Self::Offsets8 {
                offset: narrow(offset)?,
                length: narrow(length)?,
            }),
            (Layout::Offsets16, None) => Some(Self::Offsets16 {
                offset: narrow(offset)?,
                length: narrow(length)?,
            }),
            (Layout::Offsets32, None) => Some(Self::Offsets32 { offset, length }),
            (Layout::Full8, Some(l)) => Some(Self::Full8 {
                offset: narrow(offset)?,
                length: narrow(length)?,
                lines: pair(l.begin_line, l.end_line)?,
                columns: pair(l.begin_column, l.end_column)?,
            }),
            (Layout::Full16Cols8, Some(l)) => Some(Self::Full16Cols8 {
                offset: narrow(offset)?,
                length: narrow(length)?,
                lines: pair(l.begin_line, l.end_line)?,
                columns: pair(l.begin_column, l.end_column)?,
            }),
            (Layout::Full16, Some(l)) => Some(Self::Full16 {
                offset: narrow(offset)?,
                length: narrow(length)?,
                lines: pair(l.begin_line, l.end_line)?,
                columns: pair(l.begin_column, l.end_column)?,
            }),
            (Layout::Full32Cols8, Some(l)) => Some(Self::Full32Cols8 {
                offset,
                length,
                lines: [l.begin_line, l.end_line],
                columns: pair(l.begin_column, l.end_column)?,
            }),
            (Layout::Full32, Some(l)) => Some(Self::Full32 {
                offset,
                length,
                lines: [l.begin_line, l.end_line],
                columns: [l.begin_column, l.end_column],
            }),
            _ => None,
        }
    }

    /// Picks the first candidate layout that holds every field.
    fn select(fields: Fields) -> Self {
        let candidates: &[Layout] = match fields.lines {
            None => &Layout::OFFSET_CANDIDATES,
            Some(_) => &Layout::FULL_CANDIDATES,
        };
        candidates
            .iter()
            .find_map(|layout| Self::encode(*layout, fields))
            .unwrap_or_else(|| Self::widest(fields))
    }

    /// The 32-bit layouts hold any validated fields.
    const fn widest(fields: Fields) -> Self {
        match fields.lines {
            None => Self::Offsets32 {
                offset: fields.offset,
                length: fields.length,
            },
            Some(l) => Self::Full32 {
                offset: fields.offset,
                length: fields.length,
                lines: [l.begin_line, l.end_line],
                columns: [l.begin_column, l.end_column],
            },
        }
    }

    fn decode(self) -> Option<Fields> {
        fn full<A: Into<u32>, B: Into<u32>, C: Into<u32>>(
            offset: A,
            length: A,
            lines: [B; 2],
            columns: [C; 2],
        ) -> Fields {
            let [begin_line, end_line] = lines;
            let [begin_column, end_column] = columns;
            Fields {
                offset: offset.into(),
                length: length.into(),
                lines: Some(Lines {
                    begin_line: begin_line.into(),
                    end_line: end_line.into(),
                    begin_column: begin_column.into(),
                    end_column: end_column.into(),
                }),
            }
        }
        let offsets = |offset: u32, length: u32| Fields {
            offset,
            length,
            lines: None,
        };

        match self {
            Self::None => None,
            Self::Offsets8 { offset, length } => Some(offsets(offset.into(), length.into())),
            Self::Offsets16 { offset, length } => Some(offsets(offset.into(), length.into())),
            Self::Offsets32 { offset, length } => Some(offsets(offset, length)),
            Self::Full8 {
                offset,
                length,
                lines,
                columns,
            } => Some(full(offset, length, lines, columns)),
            Self::Full16Cols8 {
                offset,
                length,
                lines,
                columns,
            } => Some(full(offset, length, lines, columns)),
            Self::Full16 {
                offset,
                length,
                lines,
                columns,
            } => Some(full(offset, length, lines, columns)),
            Self::Full32Cols8 {
                offset,
                length,
                lines,
                columns,
            } => Some(full(offset, length, lines, columns)),
            Self::Full32 {
                offset,
                length,
                lines,
                columns,
            } => Some(full(offset, length, lines, columns)),
        }
    }

    const fn layout(self) -> Layout {
        match self {
            Self::None => Layout::UriOnly,
            Self::Offsets8 { .. } => Layout::Offsets8,
            Self::Offsets16 { .. } => Layout::Offsets16,
            Self::Offsets32 { .. } => Layout::Offsets32,
            Self::Full8 { .. } => Layout::Full8,
            Self::Full16Cols8 { .. } => Layout::Full16Cols8,
            Self::Full16 { .. } => Layout::Full16,
            Self::Full32Cols8 { .. } => Layout::Full32Cols8,
            Self::Full32 { .. } => Layout::Full32,
        }
    }
}

/// A URI with optional offset/length and line/column positions.
#[derive(Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "LocationRecord", into = "LocationRecord")
)]
pub struct SourceLocation {
    uri: Arc<str>,
    positions: Positions,
}

impl SourceLocation {
    /// Creates a location that names a whole resource.
    #[must_use]
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.into(),
            positions: Positions::None,
        }
    }

    /// Creates a location with an offset and length.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for negative values or values above
    /// `u32::MAX`.
    pub fn with_offsets(uri: &str, offset: i64, length: i64) -> Result<Self> {
        let fields = Fields {
            offset: checked("offset", offset)?,
            length: checked("length", length)?,
            lines: None,
        };
        Ok(Self {
            uri: uri.into(),
            positions: Positions::select(fields),
        })
    }

    /// Creates a location with offset, length, lines, and columns.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for negative or oversized values,
    /// an end line before the begin line, or an end column before the begin
    /// column on a single line.
    pub fn with_positions(
        uri: &str,
        offset: i64,
        length: i64,
        begin_line: i64,
        end_line: i64,
        begin_column: i64,
        end_column: i64,
    ) -> Result<Self> {
        let fields = Fields {
            offset: checked("offset", offset)?,
            length: checked("length", length)?,
            lines: Some(Lines::validate(begin_line, end_line, begin_column, end_column)?),
        };
        Ok(Self {
            uri: uri.into(),
            positions: Positions::select(fields),
        })
    }

    /// Re-stores the same fields in an explicit layout.
    ///
    /// The result compares and hashes equal to `self`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if the layout cannot hold the fields
    /// or stores a different set of them.
    pub fn with_layout(&self, layout: Layout) -> Result<Self> {
        let positions = match self.positions.decode() {
            None if layout == Layout::UriOnly => Some(Positions::None),
            None => None,
            Some(fields) => Positions::encode(layout, fields),
        };
        positions
            .map(|positions| Self {
                uri: Arc::clone(&self.uri),
                positions,
            })
            .ok_or_else(|| {
                Error::invalid_argument(format!("{self} does not fit the {layout:?} layout"))
            })
    }

    /// Returns the URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the selected layout.
    #[must_use]
    pub const fn layout(&self) -> Layout {
        self.positions.layout()
    }

    /// Returns true if offset and length are present.
    #[must_use]
    pub const fn has_offset_length(&self) -> bool {
        self.layout().has_offset_length()
    }

    /// Returns true if lines and columns are present.
    #[must_use]
    pub const fn has_line_column(&self) -> bool {
        self.layout().has_line_column()
    }

    fn fields(&self, operation: &'static str) -> Result<Fields> {
        self.positions
            .decode()
            .ok_or_else(|| Error::unsupported(operation, self.layout()))
    }

    fn lines(&self, operation: &'static str) -> Result<Lines> {
        self.positions
            .decode()
            .and_then(|f| f.lines)
            .ok_or_else(|| Error::unsupported(operation, self.layout()))
    }

    /// Returns the character offset.
    ///
    /// # Errors
    ///
    /// Unsupported for URI-only locations.
    pub fn offset(&self) -> Result<u32> {
        self.fields("offset").map(|f| f.offset)
    }

    /// Returns the length in characters.
    ///
    /// # Errors
    ///
    /// Unsupported for URI-only locations.
    pub fn length(&self) -> Result<u32> {
        self.fields("length").map(|f| f.length)
    }

    /// Returns the first line.
    ///
    /// # Errors
    ///
    /// Unsupported unless lines and columns are present.
    pub fn begin_line(&self) -> Result<u32> {
        self.lines("begin_line").map(|l| l.begin_line)
    }

    /// Returns the last line.
    ///
    /// # Errors
    ///
    /// Unsupported unless lines and columns are present.
    pub fn end_line(&self) -> Result<u32> {
        self.lines("end_line").map(|l| l.end_line)
    }

    /// Returns the column on the first line.
    ///
    /// # Errors
    ///
    /// Unsupported unless lines and columns are present.
    pub fn begin_column(&self) -> Result<u32> {
        self.lines("begin_column").map(|l| l.begin_column)
    }

    /// Returns the column on the last line.
    ///
    /// # Errors
    ///
    /// Unsupported unless lines and columns are present.
    pub fn end_column(&self) -> Result<u32> {
        self.lines("end_column").map(|l| l.end_column)
    }

    /// Returns the location of the whole resource.
    #[must_use]
    pub fn top(&self) -> Self {
        Self {
            uri: Arc::clone(&self.uri),
            positions: Positions::None,
        }
    }

    /// Returns a location with a new offset and length. Lines and columns are
    /// kept if present.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for negative or oversized values.
    pub fn set_offset_length(&self, offset: i64, length: i64) -> Result<Self> {
        let fields = Fields {
            offset: checked("offset", offset)?,
            length: checked("length", length)?,
            lines: self.positions.decode().and_then(|f| f.lines),
        };
        Ok(Self {
            uri: Arc::clone(&self.uri),
            positions: Positions::select(fields),
        })
    }

    /// Returns a location with new lines and columns, keeping offset and
    /// length.
    ///
    /// # Errors
    ///
    /// Unsupported for URI-only locations; invalid-argument for bad ranges.
    pub fn set_line_column(
        &self,
        begin_line: i64,
        end_line: i64,
        begin_column: i64,
        end_column: i64,
    ) -> Result<Self> {
        let current = self.fields("set_line_column")?;
        let fields = Fields {
            lines: Some(Lines::validate(begin_line, end_line, begin_column, end_column)?),
            ..current
        };
        Ok(Self {
            uri: Arc::clone(&self.uri),
            positions: Positions::select(fields),
        })
    }
}

impl PartialEq for SourceLocation {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri && self.positions.decode() == other.positions.decode()
    }
}

impl Eq for SourceLocation {}

impl Hash for SourceLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
        self.positions.decode().hash(state);
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{}|", self.uri)?;
        if let Some(fields) = self.positions.decode() {
            write!(f, "({},{}", fields.offset, fields.length)?;
            if let Some(l) = fields.lines {
                write!(
                    f,
                    ",<{},{}>,<{},{}>",
                    l.begin_line, l.begin_column, l.end_line, l.end_column
                )?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} [{:?}]", self.layout())
    }
}

/// Logical fields as they appear on the wire.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct LocationRecord {
    uri: String,
    offset: Option<i64>,
    length: Option<i64>,
    begin_line: Option<i64>,
    end_line: Option<i64>,
    begin_column: Option<i64>,
    end_column: Option<i64>,
}

#[cfg(feature = "serde")]
impl From<SourceLocation> for LocationRecord {
    fn from(loc: SourceLocation) -> Self {
        let fields = loc.positions.decode();
        let lines = fields.and_then(|f| f.lines);
        Self {
            uri: loc.uri.to_string(),
            offset: fields.map(|f| i64::from(f.offset)),
            length: fields.map(|f| i64::from(f.length)),
            begin_line: lines.map(|l| i64::from(l.begin_line)),
            end_line: lines.map(|l| i64::from(l.end_line)),
            begin_column: lines.map(|l| i64::from(l.begin_column)),
            end_column: lines.map(|l| i64::from(l.end_column)),
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<LocationRecord> for SourceLocation {
    type Error = Error;

    fn try_from(record: LocationRecord) -> Result<Self> {
        match record {
            LocationRecord {
                uri,
                offset: Some(offset),
                length: Some(length),
                begin_line: Some(bl),
                end_line: Some(el),
                begin_column: Some(bc),
                end_column: Some(ec),
            } => Self::with_positions(&uri, offset, length, bl, el, bc, ec),
            LocationRecord {
                uri,
                offset: Some(offset),
                length: Some(length),
                begin_line: None,
                end_line: None,
                begin_column: None,
                end_column: None,
            } => Self::with_offsets(&uri, offset, length),
            LocationRecord {
                uri,
                offset: None,
                length: None,
                begin_line: None,
                end_line: None,
                begin_column: None,
                end_column: None,
            } => Ok(Self::new(&uri)),
            _ => Err(Error::invalid_argument("incomplete source location fields")),
        }
    }
}
