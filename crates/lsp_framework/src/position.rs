use kestrel_primitives::OffsetEncoding;
use lsp_types::TextDocumentContentChangeEvent;
use ropey::Rope;

pub use kestrel_primitives::{char_to_position, chars_to_range, position_to_char, range_to_chars};

/// Builds a single incremental `TextDocumentContentChangeEvent` describing the
/// replacement of `old_chars` with `new_text`, against `rope` (which must
/// already reflect the *post*-edit text, since the range is computed from it).
///
/// `old_chars` is the char range in the *pre*-edit document; `rope` is the
/// *post*-edit rope. The emitted range covers the post-edit span that now
/// holds `new_text`, which is what `textDocument/didChange` expects for a
/// replacement.
pub fn incremental_change(rope: &Rope, new_start_char: usize, new_text: &str, encoding: OffsetEncoding) -> kestrel_primitives::Result<TextDocumentContentChangeEvent> {
	let new_end_char = new_start_char + new_text.chars().count();
	let range = chars_to_range(rope, new_start_char..new_end_char, encoding)?;
	Ok(TextDocumentContentChangeEvent { range: Some(range), range_length: None, text: new_text.to_string() })
}

/// Builds the whole-document `TextDocumentContentChangeEvent` used for a full
/// resync: no `range`, just the complete current text.
pub fn full_change(text: impl Into<String>) -> TextDocumentContentChangeEvent {
	TextDocumentContentChangeEvent { range: None, range_length: None, text: text.into() }
}
