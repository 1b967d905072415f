use std::path::Path;

use lsp_types::Uri;

use crate::error::{Error, Result};

/// Converts an absolute filesystem path to the `file://` URI LSP servers
/// expect, percent-encoding it the way `url::Url::from_file_path` does.
pub fn uri_from_path(path: &Path) -> Result<Uri> {
	let url = url::Url::from_file_path(path).map_err(|()| Error::InvalidUri(path.to_path_buf()))?;
	url.as_str().parse::<Uri>().map_err(|_| Error::InvalidUri(path.to_path_buf()))
}
