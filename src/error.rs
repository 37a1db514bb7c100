use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while setting up or running the governor
#[derive(Error, Debug)]
pub enum GovernorError {
	#[error("Invalid configuration: {0}")]
	Config(String),

	#[error("Insufficient privilege: {0}")]
	Permission(String),

	#[error("Cannot probe {}: {source}", .path.display())]
	Probe {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("Scaling governor for cpu{cpu} is {found:?}, expected \"userspace\"")]
	GovernorMismatch { cpu: usize, found: String },

	#[error("IO error: {0}")]
	Io(#[from] io::Error),

	#[error("Parse error: {0}")]
	Parse(String),
}

pub type Result<T> = std::result::Result<T, GovernorError>;

impl GovernorError {
	/// Wraps an IO error raised while reading or writing a control file during startup
	pub fn probe(path: impl Into<PathBuf>, source: io::Error) -> Self {
		Self::Probe {
			path: path.into(),
			source,
		}
	}

	/// Whether the error should stop the daemon
	///
	/// Only runtime IO and parse failures are recoverable; the poll loop drops the affected
	/// unit for one cycle and tries again on the next one.
	pub fn is_fatal(&self) -> bool {
		!matches!(self, Self::Io(_) | Self::Parse(_))
	}

	/// Process exit status for a fatal error
	pub fn exit_code(&self) -> i32 {
		match self {
			Self::Config(_) => libc::ENOTSUP,
			Self::Permission(_) => libc::EPERM,
			Self::GovernorMismatch { .. } => libc::EPIPE,
			Self::Probe { source, .. } | Self::Io(source) => source.raw_os_error().unwrap_or(1),
			Self::Parse(_) => libc::EINVAL,
		}
	}
}
