use lsp_types::{Position, PositionEncodingKind};
use ropey::Rope;

use crate::error::{Error, Result};

/// Which unit a server's `character` offsets are counted in. Negotiated during
/// `initialize` via `general.positionEncodings`; defaults to UTF-16 because
/// that's the only encoding every LSP server is required to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetEncoding {
	/// `character` counts UTF-8 bytes.
	Utf8,
	/// `character` counts UTF-16 code units — the LSP default.
	#[default]
	Utf16,
	/// `character` counts Unicode scalar values (`char`s).
	Utf32,
}

impl OffsetEncoding {
	pub fn from_lsp(kind: &PositionEncodingKind) -> Self {
		match kind.as_str() {
			"utf-8" => OffsetEncoding::Utf8,
			"utf-32" => OffsetEncoding::Utf32,
			_ => OffsetEncoding::Utf16,
		}
	}

	pub fn to_lsp(self) -> PositionEncodingKind {
		match self {
			OffsetEncoding::Utf8 => PositionEncodingKind::UTF8,
			OffsetEncoding::Utf16 => PositionEncodingKind::UTF16,
			OffsetEncoding::Utf32 => PositionEncodingKind::UTF32,
		}
	}

	/// Picks the best encoding both sides support, preferring UTF-8 (cheapest
	/// for a Rust client) and falling back to the LSP-mandated UTF-16 default.
	pub fn negotiate(server_offered: &[PositionEncodingKind]) -> Self {
		if server_offered.iter().any(|k| k.as_str() == "utf-8") {
			OffsetEncoding::Utf8
		} else {
			OffsetEncoding::Utf16
		}
	}
}

/// The half-open char range spanning `line` in `rope`, with `(start_char, end_char)`.
fn line_char_bounds(rope: &Rope, line: usize) -> Result<(usize, usize)> {
	if line >= rope.len_lines() {
		return Err(Error::LineOutOfBounds(line as u32));
	}
	let start = rope.line_to_char(line);
	let end = if line + 1 < rope.len_lines() { rope.line_to_char(line + 1) } else { rope.len_chars() };
	Ok((start, end))
}

pub fn position_to_char(rope: &Rope, pos: Position, encoding: OffsetEncoding) -> Result<usize> {
	let line = pos.line as usize;
	let (line_start, line_end) = line_char_bounds(rope, line)?;
	let oob = || Error::ColumnOutOfBounds { line: pos.line, character: pos.character };

	let offset_in_line = match encoding {
		OffsetEncoding::Utf8 => {
			let line_start_byte = rope.char_to_byte(line_start);
			let line_end_byte = rope.char_to_byte(line_end);
			let target_byte = line_start_byte + pos.character as usize;
			if target_byte > line_end_byte {
				return Err(oob());
			}
			rope.byte_to_char(target_byte) - line_start
		}
		OffsetEncoding::Utf16 => {
			let line_start_cu = rope.char_to_utf16_cu(line_start);
			let line_end_cu = rope.char_to_utf16_cu(line_end);
			let target_cu = line_start_cu + pos.character as usize;
			if target_cu > line_end_cu {
				return Err(oob());
			}
			rope.utf16_cu_to_char(target_cu) - line_start
		}
		OffsetEncoding::Utf32 => {
			let target = pos.character as usize;
			if line_start + target > line_end {
				return Err(oob());
			}
			target
		}
	};

	Ok(line_start + offset_in_line)
}

pub fn char_to_position(rope: &Rope, char_idx: usize, encoding: OffsetEncoding) -> Result<Position> {
	if char_idx > rope.len_chars() {
		return Err(Error::CharOutOfBounds(char_idx));
	}
	let line = rope.char_to_line(char_idx);
	let line_start = rope.line_to_char(line);

	let character = match encoding {
		OffsetEncoding::Utf8 => rope.char_to_byte(char_idx) - rope.char_to_byte(line_start),
		OffsetEncoding::Utf16 => rope.char_to_utf16_cu(char_idx) - rope.char_to_utf16_cu(line_start),
		OffsetEncoding::Utf32 => char_idx - line_start,
	};

	Ok(Position::new(line as u32, character as u32))
}
