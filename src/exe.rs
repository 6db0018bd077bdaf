use std::{
    borrow::Cow,
    fmt::{self, Formatter},
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

const PREFIX: &str = "lazyexe-";

/// Suffix the platform loader requires to dispatch a file as executable.
/// Windows resolves executability by filename, everything else by mode bits.
fn exe_suffix() -> &'static str {
    if cfg!(windows) {
        ".exe"
    } else {
        ""
    }
}

#[cfg(unix)]
fn set_executable(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    // owner-only rwx: nobody else may run or inspect the payload
    file.set_permissions(fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn set_executable(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

/// Error materializing or removing the on-disk payload
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The temp-file facility could not allocate a uniquely named file
    #[error("cannot create temp file")]
    Create(#[source] io::Error),

    #[error("cannot write payload")]
    Write(#[source] io::Error),

    #[error("cannot mark file executable")]
    Permissions(#[source] io::Error),

    #[error("cannot flush temp file")]
    Flush(#[source] io::Error),

    /// The temp file could not be detached from its delete-on-drop guard
    #[error(transparent)]
    Persist(#[from] tempfile::PathPersistError),

    /// `cleanup` could not delete the materialized file
    #[error("cannot remove materialized file")]
    Remove(#[source] io::Error),
}

/// Alias for `Result<T, Error>` to return from `LazyExe` methods
pub type Result<T> = std::result::Result<T, Error>;

/// An in-memory payload written to a uniquely named temporary file the
/// first time its path is requested.
///
/// [`path`] performs the write exactly once per episode and returns the
/// same path on every later call; [`cleanup`] deletes the file and resets
/// the instance so it may be materialized again. Dropping a `LazyExe`
/// does *not* delete the file — the caller must guarantee `cleanup` runs
/// on every exit path of its own scope. `cleanup` is idempotent and safe
/// to call on a never-materialized instance, so unconditional calls are
/// fine.
///
/// ```no_run
/// use lazy_exe::LazyExe;
///
/// # fn main() -> lazy_exe::Result<()> {
/// static PAYLOAD: &[u8] = b"\x7fELF..."; // e.g. include_bytes!(..)
///
/// let exe = LazyExe::new(PAYLOAD);
/// let path = exe.path()?;
/// // hand `path` to std::process::Command, etc.
/// exe.cleanup()?;
/// # Ok(())
/// # }
/// ```
///
/// [`path`]: Self::path
/// [`cleanup`]: Self::cleanup
pub struct LazyExe {
    bytes: Cow<'static, [u8]>,
    dir: Option<PathBuf>,
    // non-`None` once the payload is on disk
    file: Mutex<Option<PathBuf>>,
}

impl LazyExe {
    /// Constructs a new `LazyExe` which will be written to
    /// [`std::env::temp_dir()`] when the path is first requested.
    ///
    /// No filesystem I/O happens here.
    pub fn new(bytes: impl Into<Cow<'static, [u8]>>) -> Self {
        Self { bytes: bytes.into(), dir: None, file: Mutex::new(None) }
    }

    /// Constructs a new `LazyExe` which materializes into the specified
    /// directory instead of the host temp directory.
    pub fn new_in(bytes: impl Into<Cow<'static, [u8]>>, dir: impl Into<PathBuf>) -> Self {
        Self { bytes: bytes.into(), dir: Some(dir.into()), file: Mutex::new(None) }
    }

    fn lock(&self) -> MutexGuard<'_, Option<PathBuf>> {
        // the guarded value is consistent on every unwind path, so a
        // poisoned lock carries no broken invariant
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the temporary path of the payload written on disk, lazily
    /// writing and chmoding it when first requested.
    ///
    /// Concurrent callers block until the first writer finishes, then all
    /// observe the same path without redoing the write. On error nothing
    /// is recorded and the next call attempts materialization again; the
    /// partially written file is removed before this returns.
    pub fn path(&self) -> Result<PathBuf> {
        let mut file = self.lock();
        if let Some(path) = file.as_ref() {
            return Ok(path.clone());
        }

        let path = self.materialize()?;
        *file = Some(path.clone());
        Ok(path)
    }

    // holds a `NamedTempFile` until the last step: any failure drops the
    // guard, which unlinks the partial file
    fn materialize(&self) -> Result<PathBuf> {
        use std::io::Write;

        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX).suffix(exe_suffix());

        let mut temp = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(Error::Create)?;

        temp.write_all(&self.bytes).map_err(Error::Write)?;
        set_executable(temp.as_file()).map_err(Error::Permissions)?;
        temp.as_file().sync_all().map_err(Error::Flush)?;

        Ok(temp.into_temp_path().keep()?)
    }

    /// Removes the temporary file written to disk, if any, returning the
    /// instance to the unmaterialized state.
    ///
    /// A no-op when nothing was materialized. If deletion fails the
    /// recorded path is kept, so calling `cleanup` again retries it.
    pub fn cleanup(&self) -> Result<()> {
        let mut file = self.lock();
        if let Some(path) = file.as_ref() {
            fs::remove_file(path).map_err(Error::Remove)?;
            *file = None;
        }
        Ok(())
    }

    /// Whether the payload is currently on disk.
    pub fn is_materialized(&self) -> bool {
        self.lock().is_some()
    }
}

impl fmt::Debug for LazyExe {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyExe")
            .field("bytes", &format_args!("[u8; {}]", self.bytes.len()))
            .field("dir", &self.dir.as_deref().map(Path::display))
            .field("file", &self.lock().as_deref().map(Path::display))
            .finish()
    }
}
