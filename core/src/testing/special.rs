//! Special judge protocol.
//!
//! The judge reads the testcase input followed by the contestant's output on
//! stdin (each followed by a newline), writes a free-text verdict to stdout
//! and reports through its exit code: `0` accepted, `1` wrong answer, anything
//! else means the judge itself broke.

use std::path::{Path, PathBuf};

use super::{
    result::*,
    runner::{describe_failure, io_outcome, Cmdline, Execution, Runner},
};

/// Scratch files used to talk to a special judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeFiles {
    pub merged: PathBuf,
    pub verdict: PathBuf,
}

impl JudgeFiles {
    pub const MERGED_FILENAME: &str = "in_out.txt";
    pub const VERDICT_FILENAME: &str = "verdict.txt";

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            merged: dir.as_ref().join(Self::MERGED_FILENAME),
            verdict: dir.as_ref().join(Self::VERDICT_FILENAME),
        }
    }
}

pub async fn special_judge(
    runner: &Runner,
    judge: &Cmdline,
    input: &Path,
    actual_output: &Path,
    files: &JudgeFiles,
) -> Outcome {
    if let Err(outcome) = merge_files(input, actual_output, &files.merged) {
        return outcome;
    }

    let limit = runner.special_time_limit();
    let execution = runner
        .execute(judge, Some(&files.merged), Some(&files.verdict), limit)
        .await;

    match execution {
        Execution::Rejected(outcome) => outcome,
        Execution::Exited { status, elapsed } => {
            let verdict = match status.code() {
                Some(0) => Verdict::Accepted,
                Some(1) => Verdict::WrongAnswer,
                _ => {
                    return Outcome {
                        time_used: elapsed,
                        ..Outcome::with_message(
                            Verdict::RuntimeError,
                            describe_failure(judge, status),
                        )
                    }
                }
            };
            let message = fsutil::read(&files.verdict)
                .map(|bytes| String::from_utf8_lossy(&bytes).trim_end().to_owned())
                .unwrap_or_else(|e| {
                    log::warn!("Cannot read special judge verdict: {:#}", e);
                    String::new()
                });
            Outcome {
                time_used: elapsed,
                ..Outcome::with_message(verdict, message)
            }
        }
        Execution::TimedOut { limit } => Outcome::with_time(Verdict::TimeLimitExceeded, limit),
        Execution::Failed(e) => Outcome::with_message(
            Verdict::UnknownError,
            format!("Failed to run special judge '{}': {}", judge, e),
        ),
    }
}

/// Write `<input>\n<output>\n` to `dest`.
fn merge_files(input: &Path, output: &Path, dest: &Path) -> Result<(), Outcome> {
    let read = |path: &Path| {
        std::fs::read(path).map_err(|e| io_outcome(path, e))
    };
    let mut merged = read(input)?;
    merged.push(b'\n');
    merged.extend(read(output)?);
    merged.push(b'\n');

    fsutil::write(dest, merged).map_err(|e| {
        Outcome::with_message(Verdict::UnknownError, e.to_string())
    })
}
