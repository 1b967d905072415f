//! Typed, capability-gated requests and notifications layered over
//! [`super::ClientHandle`]'s raw `call`/`fire`. One submodule per LSP
//! feature area; this is also the one place outside [`crate::sync`] the
//! low-level `text_document_did_*` notifications may be called from.

mod code_action;
mod diagnostics;
mod file_ops;
mod formatting;
mod inlay_hint;
mod navigation;
mod rename;
mod sync;

use lsp_types::OneOf;

/// Whether a `OneOf<bool, Options>`-shaped capability field is present at all,
/// regardless of which side of the `OneOf` the server chose.
fn one_of_enabled<T>(cap: &Option<OneOf<bool, T>>) -> bool {
	match cap {
		None => false,
		Some(OneOf::Left(enabled)) => *enabled,
		Some(OneOf::Right(_)) => true,
	}
}
