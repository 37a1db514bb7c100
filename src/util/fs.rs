use std::fmt::Debug;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Whole-file access to the kernel's control and accounting files
///
/// The governor never touches the filesystem directly; everything goes through this trait so the
/// engine can run against a scratch directory that mimics `/sys` and `/proc`.
pub trait SysfsAccess: Debug {
	/// Reads the whole file at `path` (relative to the filesystem root)
	fn read_to_string(&self, path: &Path) -> io::Result<String>;

	/// Writes `contents` to an existing file with a single write call
	///
	/// Returns the number of bytes the kernel accepted, which may be short.
	fn write(&self, path: &Path, contents: &[u8]) -> io::Result<usize>;
}

/// Filesystem access anchored at a root directory, `/` on a live system
#[derive(Debug, Clone)]
pub struct RootedFs {
	root: PathBuf,
}

impl RootedFs {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Access to the live system
	pub fn host() -> Self {
		Self::new("/")
	}

	pub fn resolve(&self, path: &Path) -> PathBuf {
		self.root.join(path)
	}
}

impl SysfsAccess for RootedFs {
	fn read_to_string(&self, path: &Path) -> io::Result<String> {
		fs::read_to_string(self.resolve(path))
	}

	fn write(&self, path: &Path, contents: &[u8]) -> io::Result<usize> {
		let mut file = OpenOptions::new().write(true).truncate(true).open(self.resolve(path))?;
		file.write(contents)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rooted_fs_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("scaling_setspeed"), "0\n").unwrap();
		let fs = RootedFs::new(dir.path());

		let written = fs.write(Path::new("scaling_setspeed"), b"1600000\n").unwrap();
		assert_eq!(written, 8);
		assert_eq!(fs.read_to_string(Path::new("scaling_setspeed")).unwrap(), "1600000\n");
	}

	#[test]
	fn test_write_does_not_create_files() {
		let dir = tempfile::tempdir().unwrap();
		let fs = RootedFs::new(dir.path());
		let err = fs.write(Path::new("missing"), b"1\n").unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::NotFound);
	}

	#[test]
	fn test_resolve_strips_nothing() {
		let fs = RootedFs::host();
		assert_eq!(fs.resolve(Path::new("proc/stat")), PathBuf::from("/proc/stat"));
	}
}
