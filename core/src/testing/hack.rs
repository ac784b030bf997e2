//! Randomized stress search ("hacking").
//!
//! A worker task keeps generating inputs until the candidate disagrees with
//! the reference (or fails outright), or until the generator or the reference
//! itself breaks. The number of attempts is published over a watch channel so
//! a reporter can render progress while the search runs.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tokio::{sync::watch, task::JoinHandle};

use super::{
    compare::compare,
    result::*,
    runner::{Cmdline, Runner},
    special::{special_judge, JudgeFiles},
    testcase,
};

/// What decides whether the candidate's output is right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A trusted solution whose output must match token by token.
    Solution(Cmdline),
    SpecialJudge(Cmdline),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HackPlan {
    pub candidate: Cmdline,
    pub generator: Cmdline,
    pub reference: Reference,
}

/// Scratch files the search loop writes; each is written by one step at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HackFiles {
    pub input: PathBuf,
    pub answer: PathBuf,
    pub output: PathBuf,
    pub judge: JudgeFiles,
}

impl HackFiles {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            input: dir.join("hack.in"),
            answer: dir.join("hack.out"),
            output: dir.join("test.out"),
            judge: JudgeFiles::in_dir(dir),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HackEnd {
    GeneratorError,
    StandardSolutionError,
    SpecialJudgeError,
    /// The candidate failed on the last generated input.
    Hacked,
}

impl HackEnd {
    pub fn is_hacked(self) -> bool {
        self == HackEnd::Hacked
    }
}

/// Final state of one search. `outcome` is whatever ended it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HackReport {
    pub attempts: u64,
    pub end: HackEnd,
    pub outcome: Outcome,
}

/// Run the search loop to its end. `progress` receives the attempt count,
/// bumped once per generated input.
pub async fn hack(
    runner: &Runner,
    plan: &HackPlan,
    files: &HackFiles,
    progress: &watch::Sender<u64>,
) -> HackReport {
    let mut attempts = 0;
    loop {
        attempts += 1;
        progress.send_replace(attempts);

        let (end, outcome) = match attempt(runner, plan, files).await {
            Ok(()) => continue,
            Err(stop) => stop,
        };
        log::debug!("Search stopped after {} attempts: {:?}", attempts, end);
        return HackReport {
            attempts,
            end,
            outcome,
        };
    }
}

async fn attempt(runner: &Runner, plan: &HackPlan, files: &HackFiles) -> Result<(), (HackEnd, Outcome)> {
    use HackEnd::*;

    let res = runner
        .special_run(&plan.generator, None, Some(&files.input))
        .await;
    if !res.is_good() {
        return Err((GeneratorError, res));
    }

    match &plan.reference {
        Reference::Solution(solution) => {
            let res = runner
                .special_run(solution, Some(&files.input), Some(&files.answer))
                .await;
            if !res.is_good() {
                return Err((StandardSolutionError, res));
            }

            let run = runner
                .run(&plan.candidate, Some(&files.input), Some(&files.output), None)
                .await;
            if !run.is_good() {
                return Err((Hacked, run));
            }

            let judged = compare(&files.answer, &files.output);
            if !judged.is_good() {
                return Err((Hacked, run.judged_by(judged)));
            }
        }
        Reference::SpecialJudge(spj) => {
            let run = runner
                .run(&plan.candidate, Some(&files.input), Some(&files.output), None)
                .await;
            if !run.is_good() {
                return Err((Hacked, run));
            }

            let judged =
                special_judge(runner, spj, &files.input, &files.output, &files.judge).await;
            match judged.verdict {
                v if v.is_good() => {}
                Verdict::WrongAnswer => return Err((Hacked, run.judged_by(judged))),
                _ => return Err((SpecialJudgeError, judged)),
            }
        }
    }
    Ok(())
}

/// A search running on its own task. Dropping it aborts the search.
#[derive(Debug)]
pub struct HackWorker {
    handle: JoinHandle<HackReport>,
    progress: watch::Receiver<u64>,
}

impl HackWorker {
    pub fn spawn(runner: Runner, plan: HackPlan, files: HackFiles) -> Self {
        let (tx, rx) = watch::channel(0);
        let handle = tokio::spawn(async move { hack(&runner, &plan, &files, &tx).await });
        Self {
            handle,
            progress: rx,
        }
    }

    pub fn progress(&self) -> watch::Receiver<u64> {
        self.progress.clone()
    }

    /// Wait for the search to finish. Must not be called again once it has returned.
    pub async fn join(&mut self) -> anyhow::Result<HackReport> {
        (&mut self.handle).await.context("Hack worker stopped unexpectedly")
    }
}

impl Drop for HackWorker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Where a hacking testcase has been saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedTestcase {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
}

/// Persist the failing input (and the reference answer if `with_answer`) into
/// `dir` as `hack_<n>.in` / `hack_<n>.out`, with one `n` for both files.
pub fn save_hack_testcase(
    dir: impl AsRef<Path>,
    files: &HackFiles,
    with_answer: bool,
) -> anyhow::Result<SavedTestcase> {
    const PREFIX: &str = "hack_";
    let dir = dir.as_ref();
    let in_suffix = format!(".{}", testcase::FsTestcase::INPUT_EXT);
    let out_suffix = format!(".{}", testcase::FsTestcase::OUTPUT_EXT);

    let mut id = testcase::next_available_index(dir, PREFIX, &in_suffix)?;
    if with_answer {
        id = id.max(testcase::next_available_index(dir, PREFIX, &out_suffix)?);
    }

    let input = dir.join(format!("{}{}{}", PREFIX, id, in_suffix));
    testcase::persist(&files.input, &input).context("Failed to save hack input")?;

    let output = if with_answer {
        let output = dir.join(format!("{}{}{}", PREFIX, id, out_suffix));
        testcase::persist(&files.answer, &output).context("Failed to save hack answer")?;
        Some(output)
    } else {
        None
    };
    Ok(SavedTestcase { input, output })
}
