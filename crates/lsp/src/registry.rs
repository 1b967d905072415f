//! Keeps one [`ClientHandle`] alive per language id and hands them out to
//! callers by filesystem path.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use kestrel_rpc::JsonValue;
use parking_lot::Mutex;

use crate::client::{ClientHandle, ServerConfig};
use crate::client::transport::LspTransport;
use crate::error::{Error, Result};

/// Opaque identity for a spawned server process. `generation` increments
/// every time a server occupying the same `slot` is respawned, so stale
/// references (a closure that captured an id before a restart) can be told
/// apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageServerId {
	slot: u32,
	generation: u32,
}

impl LanguageServerId {
	pub fn new(slot: u32, generation: u32) -> Self {
		Self { slot, generation }
	}

	pub fn slot(&self) -> u32 {
		self.slot
	}

	pub fn generation(&self) -> u32 {
		self.generation
	}
}

/// What a language needs from its server: the command to launch it and any
/// static configuration to hand it at `initialize` time.
#[derive(Debug, Clone, Default)]
pub struct LanguageServerConfig {
	pub command: String,
	pub args: Vec<String>,
	pub default_settings: Option<JsonValue>,
	pub features: LanguageFeatures,
}

/// Toggles for optional server-side capabilities a host may want to
/// suppress even when the server advertises them (e.g. disabling pull
/// diagnostics in favor of push).
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageFeatures {
	pub pull_diagnostics: bool,
}

struct Registration {
	config: LanguageServerConfig,
	client: Option<ClientHandle>,
}

/// Normalizes a handful of language ids that name the same server under
/// more than one spelling — currently just `python3`, which GtkSourceView
/// reports for Python 3 buffers but which every Python language server is
/// registered under as plain `python`.
fn normalize_language_id(language_id: &str) -> &str {
	match language_id {
		"python3" => "python",
		other => other,
	}
}

/// Owns the set of configured languages and lazily spawns one client per
/// language on first use.
pub struct Registry {
	transport: Arc<dyn LspTransport>,
	languages: Mutex<HashMap<String, Registration>>,
}

impl Registry {
	pub fn new(transport: Arc<dyn LspTransport>) -> Self {
		Self { transport, languages: Mutex::new(HashMap::new()) }
	}

	/// Registers (or replaces) the configuration for a language. Replacing an
	/// already-running language's configuration does not restart its client;
	/// the new configuration takes effect on the next spawn.
	pub fn register(&self, language_id: impl Into<String>, config: LanguageServerConfig) {
		let language_id = normalize_language_id(&language_id.into()).to_string();
		let mut languages = self.languages.lock();
		match languages.get_mut(&language_id) {
			Some(existing) => existing.config = config,
			None => {
				languages.insert(language_id, Registration { config, client: None });
			}
		}
	}

	/// Returns the client for `language_id`, spawning it (against `path`'s
	/// containing workspace) on first call. Synchronous: the handshake runs
	/// in the background, so the returned handle may not be ready yet.
	pub fn get(&self, language_id: &str, path: &Path) -> Result<ClientHandle> {
		let language_id = normalize_language_id(language_id);
		let mut languages = self.languages.lock();
		let registration = languages.get_mut(language_id).ok_or_else(|| Error::UnknownLanguage(language_id.to_string()))?;

		if let Some(client) = &registration.client {
			return Ok(client.clone());
		}

		let root_path = path.parent().map(|p| p.to_string_lossy().into_owned());
		let root_uri = path.parent().and_then(|p| crate::uri::uri_from_path(p).ok());
		let cfg = ServerConfig {
			language_id: language_id.to_string(),
			root_uri,
			root_path,
			workspace_folders: Vec::new(),
			initialization_options: registration.config.default_settings.clone(),
			trace: Default::default(),
		};

		let client = ClientHandle::spawn(self.transport.clone(), language_id.to_string(), cfg);
		registration.client = Some(client.clone());
		Ok(client)
	}

	/// Configuration registered for a language, if any.
	pub fn config(&self, language_id: &str) -> Option<LanguageServerConfig> {
		self.languages.lock().get(normalize_language_id(language_id)).map(|r| r.config.clone())
	}
}
