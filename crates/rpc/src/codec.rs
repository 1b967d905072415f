use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Error, Result};
use crate::message::JsonValue;

/// Reads one `Content-Length`-framed JSON value from `reader`, per the base
/// protocol shared by LSP and DAP. Returns `Ok(None)` on a clean EOF between
/// messages (the peer closed the stream); any other I/O failure is an `Err`.
pub async fn read_message<R>(reader: &mut BufReader<R>) -> Result<Option<JsonValue>>
where
	R: AsyncRead + Unpin,
{
	let mut content_length: Option<usize> = None;
	let mut line = String::new();

	loop {
		line.clear();
		let bytes_read = read_header_line(reader, &mut line).await?;
		if bytes_read == 0 {
			return if content_length.is_none() { Ok(None) } else { Err(Error::Codec("stream closed mid-header".into())) };
		}

		let trimmed = line.trim_end_matches(['\r', '\n']);
		if trimmed.is_empty() {
			break;
		}

		let Some((name, value)) = trimmed.split_once(':') else {
			return Err(Error::Codec(format!("malformed header line: {trimmed:?}")));
		};
		if name.trim().eq_ignore_ascii_case("content-length") {
			content_length = Some(value.trim().parse().map_err(|_| Error::Codec(format!("invalid Content-Length: {value:?}")))?);
		}
	}

	let content_length = content_length.ok_or_else(|| Error::Codec("message had no Content-Length header".into()))?;
	let mut body = vec![0u8; content_length];
	reader.read_exact(&mut body).await?;

	let value = serde_json::from_slice(&body).map_err(|e| Error::Codec(e.to_string()))?;
	Ok(Some(value))
}

/// Reads a single `\r\n`- or `\n`-terminated line into `line`, byte by byte so
/// we never read past the header block into the JSON body. Returns 0 on EOF
/// with nothing read, mirroring `AsyncBufReadExt::read_line`.
async fn read_header_line<R>(reader: &mut BufReader<R>, line: &mut String) -> Result<usize>
where
	R: AsyncRead + Unpin,
{
	use tokio::io::AsyncBufReadExt;
	reader.read_line(line).await.map_err(Error::Io)
}

/// Serializes `value` and writes it to `writer` with a `Content-Length` header.
pub async fn write_message<W>(writer: &mut W, value: &JsonValue) -> Result<()>
where
	W: AsyncWrite + Unpin,
{
	let body = serde_json::to_vec(value).map_err(|e| Error::Codec(e.to_string()))?;
	let header = format!("Content-Length: {}\r\n\r\n", body.len());
	writer.write_all(header.as_bytes()).await?;
	writer.write_all(&body).await?;
	writer.flush().await?;
	Ok(())
}
