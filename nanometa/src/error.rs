use thiserror::Error;

/// The four error kinds of the lowering pipeline (spec §7): an unresolved
/// reference, an unsupported construct, a violated record-width invariant,
/// or an I/O failure. CLI exit codes are derived from this enum.
#[derive(Debug, Error)]
pub enum Error {
	#[error("unresolved reference: {0}")]
	UnresolvedReference(String),

	#[error("unsupported construct: {0}")]
	UnsupportedConstruct(String),

	#[error("invariant violation: {0}")]
	InvariantViolation(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// Maps an error kind to the process exit code the CLI surfaces (spec §6, §7).
	pub fn exit_code(&self) -> i32 {
		match self {
			Error::Io(_) => 2,
			_ => 1,
		}
	}
}
