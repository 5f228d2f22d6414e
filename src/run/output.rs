//! Output sinks for CLI exports.

use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Where a finished artifact ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OutputTarget {
    Stdout,
    /// Directory; the generated filename is appended
    Directory(PathBuf),
    /// Exact file path, used as given
    File(PathBuf),
}

impl OutputTarget {
    pub(crate) fn from_arg(output: &Path) -> Self {
        if output.as_os_str() == "-" {
            OutputTarget::Stdout
        } else if output.is_dir() {
            OutputTarget::Directory(output.to_path_buf())
        } else {
            OutputTarget::File(output.to_path_buf())
        }
    }

    /// Directory the temporary file is created in, so the final rename stays
    /// on one filesystem.
    pub(crate) fn staging_dir(&self) -> Option<PathBuf> {
        match self {
            OutputTarget::Stdout => None,
            OutputTarget::Directory(dir) => Some(dir.clone()),
            OutputTarget::File(path) => Some(match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            }),
        }
    }

    pub(crate) fn final_path(&self, filename: &str) -> Option<PathBuf> {
        match self {
            OutputTarget::Stdout => None,
            OutputTarget::Directory(dir) => Some(dir.join(filename)),
            OutputTarget::File(path) => Some(path.clone()),
        }
    }
}

/// Writer that treats a closed downstream pipe as success, so
/// `planning_export export --output - | head` exits cleanly.
pub(crate) struct IgnoreBrokenPipe<W: Write> {
    inner: W,
}

impl<W: Write> IgnoreBrokenPipe<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for IgnoreBrokenPipe<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.write(buf) {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(buf.len()),
            other => other,
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.flush() {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    }
}
