use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("{0} (from='{1}', to='{2}): {3}")]
        FromToIO(Msg, PathBuf, PathBuf, #[source] io::Error),

        #[error("Failed to canonicalize path '{0}': {1}")]
        CanonicalizePath(PathBuf, #[source] io::Error),

        #[error("Invalid glob '{0}': {1}")]
        InvalidGlob(String, #[source] ::glob::PatternError),

        #[error("Cannot access '{0}' while globbing: {1}")]
        Glob(PathBuf, #[source] io::Error),

        #[error("Cannot make a file URI of '{0}'")]
        FileUri(PathBuf),
    }
}
pub use error::{Error, Result};

#[must_use]
pub fn mkdir_all(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::SingleIO("Cannot create dir", dir.to_owned(), e))
}

#[must_use]
pub fn write<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    fs::write(&filepath, contents)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn write_with_mkdir<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    if let Some(dir) = filepath.as_ref().parent() {
        self::mkdir_all(dir)?;
    }
    self::write(filepath, contents)
}

#[must_use]
pub fn read(filepath: impl AsRef<Path>) -> Result<Vec<u8>> {
    fs::read(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

/// Create an empty file if `filepath` does not exist yet. Existing contents are kept.
#[must_use]
pub fn touch(filepath: impl AsRef<Path>) -> Result<()> {
    let filepath = filepath.as_ref();
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(filepath)
        .map(drop)
        .map_err(|e| Error::SingleIO("Cannot touch file", filepath.to_owned(), e))
}

#[must_use]
pub fn copy_file(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<u64> {
    fs::copy(&from, &to).map_err(|e| {
        Error::FromToIO(
            "Cannot copy file",
            from.as_ref().to_owned(),
            to.as_ref().to_owned(),
            e,
        )
    })
}

pub fn canonicalize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    path.canonicalize()
        .map_err(|e| Error::CanonicalizePath(path.to_owned(), e))
}

/// Collect regular files under `dir` whose path relative to `dir` matches `pattern`.
/// The result is sorted by path.
/// ```
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::create_dir(dir.path().join("sub")).unwrap();
/// std::fs::write(dir.path().join("a.in"), "").unwrap();
/// std::fs::write(dir.path().join("sub/b.in"), "").unwrap();
/// std::fs::write(dir.path().join("a.out"), "").unwrap();
///
/// let found = fsutil::glob_files(dir.path(), "**/*.in").unwrap();
/// assert_eq!(found, vec![dir.path().join("a.in"), dir.path().join("sub/b.in")]);
/// ```
pub fn glob_files(dir: impl AsRef<Path>, pattern: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let escaped_dir = ::glob::Pattern::escape(&dir.to_string_lossy());
    let full = format!("{}/{}", escaped_dir.trim_end_matches('/'), pattern);

    let paths = ::glob::glob(&full).map_err(|e| Error::InvalidGlob(full.clone(), e))?;
    let mut res = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| Error::Glob(e.path().to_owned(), e.into()))?;
        if path.is_file() {
            res.push(path);
        }
    }
    res.sort();
    Ok(res)
}

/// `file://` URI of an existing path.
pub fn file_uri(path: impl AsRef<Path>) -> Result<String> {
    let path = self::canonicalize_path(path)?;
    url::Url::from_file_path(&path)
        .map(String::from)
        .map_err(|()| Error::FileUri(path))
}
