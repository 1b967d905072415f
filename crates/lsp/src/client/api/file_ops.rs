//! `workspace/will{Create,Rename,Delete}Files` and the corresponding `did*`
//! notifications, gated on the server's advertised file-operation filters.
//! Orchestrating these around an actual rename/create/delete is the
//! caller's job — see [`crate::sync::DocumentSync`].

use lsp_types::{
	CreateFilesParams, DeleteFilesParams, FileCreate, FileDelete, FileOperationRegistrationOptions, RenameFilesParams, WorkspaceEdit,
};

use crate::client::ClientHandle;
use crate::error::Result;
use lsp_types::FileRename;

impl ClientHandle {
	fn file_ops(&self) -> Option<lsp_types::WorkspaceFileOperationsServerCapabilities> {
		self.capabilities().and_then(|caps| caps.workspace).and_then(|w| w.file_operations)
	}

	fn supports(filter: &Option<FileOperationRegistrationOptions>) -> bool {
		filter.is_some()
	}

	pub async fn will_rename_files(&self, files: Vec<FileRename>) -> Result<Option<WorkspaceEdit>> {
		if !self.file_ops().is_some_and(|ops| Self::supports(&ops.will_rename)) {
			return Ok(None);
		}
		self.call("workspace/willRenameFiles", RenameFilesParams { files }).await
	}

	pub async fn did_rename_files(&self, files: Vec<FileRename>) -> Result<()> {
		if !self.file_ops().is_some_and(|ops| Self::supports(&ops.did_rename)) {
			return Ok(());
		}
		self.fire("workspace/didRenameFiles", RenameFilesParams { files }).await
	}

	pub async fn will_create_files(&self, files: Vec<FileCreate>) -> Result<Option<WorkspaceEdit>> {
		if !self.file_ops().is_some_and(|ops| Self::supports(&ops.will_create)) {
			return Ok(None);
		}
		self.call("workspace/willCreateFiles", CreateFilesParams { files }).await
	}

	pub async fn did_create_files(&self, files: Vec<FileCreate>) -> Result<()> {
		if !self.file_ops().is_some_and(|ops| Self::supports(&ops.did_create)) {
			return Ok(());
		}
		self.fire("workspace/didCreateFiles", CreateFilesParams { files }).await
	}

	pub async fn will_delete_files(&self, files: Vec<FileDelete>) -> Result<Option<WorkspaceEdit>> {
		if !self.file_ops().is_some_and(|ops| Self::supports(&ops.will_delete)) {
			return Ok(None);
		}
		self.call("workspace/willDeleteFiles", DeleteFilesParams { files }).await
	}

	pub async fn did_delete_files(&self, files: Vec<FileDelete>) -> Result<()> {
		if !self.file_ops().is_some_and(|ops| Self::supports(&ops.did_delete)) {
			return Ok(());
		}
		self.fire("workspace/didDeleteFiles", DeleteFilesParams { files }).await
	}
}
