pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("line {0} is past the end of the document")]
	LineOutOfBounds(u32),
	#[error("column {character} on line {line} is past the end of that line")]
	ColumnOutOfBounds { line: u32, character: u32 },
	#[error("char offset {0} is past the end of the document")]
	CharOutOfBounds(usize),
}
