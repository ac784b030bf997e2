use std::path::{Path, PathBuf};

/// A `<stem>.in` file and, when judging, the `<stem>.out` next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsTestcase {
    name: String,
    input_path: PathBuf,
    output_path: Option<PathBuf>,
}

impl FsTestcase {
    pub const INPUT_EXT: &str = "in";
    pub const OUTPUT_EXT: &str = "out";

    pub fn new(
        name: impl Into<String>,
        input: impl Into<PathBuf>,
        output: Option<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            input_path: input.into(),
            output_path: output,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// `None` when there is no expected output, which is fine for a plain run.
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Find every `*.in` under `dir` recursively, paired with the sibling `*.out`.
    /// With `create_missing_outputs`, absent outputs are created empty.
    pub fn discover(dir: impl AsRef<Path>, create_missing_outputs: bool) -> fsutil::Result<Vec<Self>> {
        let dir = dir.as_ref();
        let pattern = format!("**/*.{}", Self::INPUT_EXT);

        let mut res = Vec::new();
        for input in fsutil::glob_files(dir, &pattern)? {
            let output = input.with_extension(Self::OUTPUT_EXT);
            let output = if output.is_file() {
                Some(output)
            } else if create_missing_outputs {
                fsutil::touch(&output)?;
                Some(output)
            } else {
                None
            };

            let name = input
                .strip_prefix(dir)
                .unwrap_or(&input)
                .to_string_lossy()
                .into_owned();
            res.push(Self::new(name, input, output));
        }
        res.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(res)
    }
}

/// Smallest `n >= 1` such that `<dir>/<prefix><n><suffix>` does not exist.
/// `dir` is created if absent.
pub fn next_available_index(dir: impl AsRef<Path>, prefix: &str, suffix: &str) -> fsutil::Result<u32> {
    let dir = dir.as_ref();
    fsutil::mkdir_all(dir)?;
    let index = (1..)
        .find(|i| !dir.join(format!("{}{}{}", prefix, i, suffix)).exists())
        .unwrap_or(u32::MAX);
    Ok(index)
}

/// Copy `source` into `target`, creating or overwriting it.
pub fn persist(source: impl AsRef<Path>, target: impl AsRef<Path>) -> fsutil::Result<()> {
    let target = target.as_ref();
    fsutil::touch(target)?;
    fsutil::copy_file(source, target).map(drop)
}
