use std::{
    collections::HashMap,
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
    process::ExitStatus,
};

use crate::config::Config;
use crate::str_interp::InterpError;
use crate::testing::{Cmdline, Outcome, Verdict};

#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    #[error("{0:?}")]
    NotFound(PathBuf),

    #[error("no `[[command]]` pattern matches '{0}'")]
    UnknownFileType(String),

    #[error("'{cmd}' exited with {status}")]
    Compile { cmd: String, status: ExitStatus },

    #[error("cannot spawn '{cmd}': {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid command template: {0}")]
    Template(#[from] InterpError),
}

impl PrepareError {
    pub fn verdict(&self) -> Verdict {
        use PrepareError::*;
        match self {
            NotFound(_) => Verdict::FileNotFound,
            UnknownFileType(_) => Verdict::UnknownFileType,
            Compile { .. } => Verdict::CompileError,
            Spawn { .. } | Template(_) => Verdict::UnknownError,
        }
    }

    /// The verdict together with the details, as shown next to the file name.
    pub fn outcome(&self) -> Outcome {
        Outcome::with_message(self.verdict(), self.to_string())
    }
}

/// Turns source files into runnable command lines, compiling when configured to.
#[derive(Debug, Clone, Copy)]
pub struct Toolchain<'a> {
    cfg: &'a Config,
    build_dir: &'a Path,
}

impl<'a> Toolchain<'a> {
    /// Compiled executables are written into `build_dir`.
    pub fn new(cfg: &'a Config, build_dir: &'a Path) -> Self {
        Self { cfg, build_dir }
    }

    /// `role` names the executable (`<build_dir>/<role>.bin`), so that the
    /// candidate, generator and judges of one session never overwrite each other.
    pub async fn prepare(&self, file: impl AsRef<Path>, role: &str) -> Result<Cmdline, PrepareError> {
        let file = file.as_ref();
        if !file.is_file() {
            return Err(PrepareError::NotFound(file.to_owned()));
        }

        let filename = file
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let entry = self
            .cfg
            .find_command_for_filename(&filename)
            .ok_or_else(|| PrepareError::UnknownFileType(filename.clone()))?;

        if has_single_quote(file) {
            log::warn!(
                "Path contains a single quote, which breaks '#{{filePath}}'-style quoting: {}",
                file.to_string_lossy()
            );
        }

        let exe_path = self.build_dir.join(format!("{}.bin", role));
        let vars = make_cmd_interp_vars(file, &exe_path);

        if let Some(compile) = &entry.compile {
            let cmd = compile.render(&vars)?;
            log::info!("Compiling {}...", filename);
            log::debug!("{}", cmd);
            self.compile(&cmd).await?;
        }

        let run = entry.run.render(&vars)?;
        log::debug!("Run command for {}: {}", filename, run);
        Ok(Cmdline::shell(&self.cfg.shell, run))
    }

    async fn compile(&self, cmd: &str) -> Result<(), PrepareError> {
        let status = Cmdline::shell(&self.cfg.shell, cmd)
            .to_command()
            .status()
            .await
            .map_err(|source| PrepareError::Spawn {
                cmd: cmd.to_owned(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(PrepareError::Compile {
                cmd: cmd.to_owned(),
                status,
            })
        }
    }
}

fn has_single_quote(path: &Path) -> bool {
    path.as_os_str().as_encoded_bytes().contains(&b'\'')
}

fn make_cmd_interp_vars<'p>(filepath: &'p Path, exe_path: &'p Path) -> HashMap<&'static str, &'p OsStr> {
    let mut m: HashMap<_, &OsStr> = HashMap::new();
    m.insert("filePath", filepath.as_os_str());
    m.insert("fileName", filepath.file_name().unwrap_or_default());
    m.insert(
        "fileDir",
        filepath
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .as_os_str(),
    );
    m.insert("fileStem", filepath.file_stem().unwrap_or_default());
    m.insert("fileExt", filepath.extension().unwrap_or_default());
    m.insert("exePath", exe_path.as_os_str());
    m
}
