//! Rope-backed text position utilities shared by the LSP framework: converting
//! between `ropey`'s char offsets and the line/column positions LSP speaks on
//! the wire, in whichever offset encoding the server negotiated.

mod error;
mod offset;

pub use error::{Error, Result};
pub use offset::OffsetEncoding;

use lsp_types::{Position, Range};
use ropey::Rope;

/// Converts an LSP [`Position`] to a char offset into `rope`, per `encoding`.
///
/// Returns [`Error::LineOutOfBounds`] or [`Error::ColumnOutOfBounds`] if `pos`
/// does not address real text — most commonly because the document changed
/// out from under a stale position sent by the server.
pub fn position_to_char(rope: &Rope, pos: Position, encoding: OffsetEncoding) -> Result<usize> {
	offset::position_to_char(rope, pos, encoding)
}

/// Converts a char offset into `rope` to an LSP [`Position`], per `encoding`.
pub fn char_to_position(rope: &Rope, char_idx: usize, encoding: OffsetEncoding) -> Result<Position> {
	offset::char_to_position(rope, char_idx, encoding)
}

/// Converts an LSP [`Range`] to a char range `start..end` into `rope`.
pub fn range_to_chars(rope: &Rope, range: Range, encoding: OffsetEncoding) -> Result<std::ops::Range<usize>> {
	let start = position_to_char(rope, range.start, encoding)?;
	let end = position_to_char(rope, range.end, encoding)?;
	Ok(start..end)
}

/// Converts a char range into `rope` to an LSP [`Range`].
pub fn chars_to_range(rope: &Rope, chars: std::ops::Range<usize>, encoding: OffsetEncoding) -> Result<Range> {
	let start = char_to_position(rope, chars.start, encoding)?;
	let end = char_to_position(rope, chars.end, encoding)?;
	Ok(Range::new(start, end))
}
