//! Wraps an already-open pair of raw file descriptors as async streams.
//!
//! Spawning a server via [`crate::process::ServerProcess`] is the common
//! path and needs none of this — `tokio::process` already hands back async
//! `ChildStdin`/`ChildStdout`. This module exists for the other path: a
//! server reached over a pipe or socketpair the host set up itself (for
//! instance a language server launched by a supervising process that only
//! passes this client a pair of fds), where we need to mark the descriptors
//! non-blocking and hand tokio a stream type over them.

use std::os::unix::io::{FromRawFd, OwnedFd, RawFd};

use crate::error::{Error, Result};

/// The async read/write halves of a raw fd pair, non-blocking and owned by
/// the returned handles (closed on drop).
pub struct RawDuplex {
	pub reader: tokio::net::unix::pipe::Receiver,
	pub writer: tokio::net::unix::pipe::Sender,
}

/// Takes ownership of `read_fd`/`write_fd`, sets `O_NONBLOCK` on both, and
/// wraps them for use with [`kestrel_rpc::Peer::spawn`].
///
/// # Safety
/// `read_fd` and `write_fd` must be valid, open, not-otherwise-owned
/// descriptors; ownership transfers to the returned [`RawDuplex`].
pub unsafe fn from_raw_fds(read_fd: RawFd, write_fd: RawFd) -> Result<RawDuplex> {
	let read_fd = OwnedFd::from_raw_fd(read_fd);
	let write_fd = OwnedFd::from_raw_fd(write_fd);
	set_nonblocking(&read_fd)?;
	set_nonblocking(&write_fd)?;

	let reader = tokio::net::unix::pipe::Receiver::from_file(std::fs::File::from(read_fd)).map_err(Error::Io)?;
	let writer = tokio::net::unix::pipe::Sender::from_file(std::fs::File::from(write_fd)).map_err(Error::Io)?;
	Ok(RawDuplex { reader, writer })
}

fn set_nonblocking(fd: &OwnedFd) -> Result<()> {
	let flags = rustix::fs::fcntl_getfl(fd).map_err(std::io::Error::from)?;
	rustix::fs::fcntl_setfl(fd, flags | rustix::fs::OFlags::NONBLOCK).map_err(std::io::Error::from)?;
	Ok(())
}
