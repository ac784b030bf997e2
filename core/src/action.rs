pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use error::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::scratch::Scratch;
use crate::style;
use crate::testing::hack::{save_hack_testcase, SavedTestcase};
use crate::testing::{
    compare, special_judge, Cmdline, FsTestcase, HackEnd, HackFiles, HackPlan, HackReport,
    HackWorker, JudgeFiles, Outcome, Reference, Runner, Verdict,
};

/// Tally of a run or judge session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub passed: usize,
    pub total: usize,
    pub slowest: Duration,
    /// Number of testcases per verdict, for those that did not pass.
    pub failures: BTreeMap<Verdict, usize>,
}

impl SessionSummary {
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    fn record_failure(&mut self, verdict: Verdict) {
        *self.failures.entry(verdict).or_default() += 1;
    }

    fn log(&self) {
        log::info!("");
        log::info!("Passed {} / {}", self.passed, self.total);
        if !self.all_passed() {
            let detail = self
                .failures
                .iter()
                .map(|(&verdict, &cnt)| {
                    format!(
                        "{}{}{}",
                        style::verdict_badge(verdict),
                        "x".dimmed(),
                        cnt.to_string().bold().bright_white(),
                    )
                })
                .collect::<Vec<String>>()
                .join(", ");
            log::info!("Failed: {}", detail);
        }
        log::info!(
            "Slowest: {} ms",
            self.slowest.as_millis().to_string().green()
        );
    }
}

const SPINNER_FRAMES: &[&str] = &[
    "[    ]", "[>   ]", "[>>  ]", "[>>> ]", "[ >>>]", "[  >>]", "[   >]", "[>>>>]",
];
const TICK_INTERVAL: Duration = Duration::from_millis(50);

fn spinner(msg: String) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(SPINNER_FRAMES);
    ProgressBar::new_spinner().with_style(style).with_message(msg)
}

fn find_testcases(dir: &Path, create_missing_outputs: bool) -> Result<Vec<FsTestcase>> {
    ensure!(
        dir.is_dir(),
        "Testcase directory not found: {}",
        dir.to_string_lossy()
    );
    let testcases = FsTestcase::discover(dir, create_missing_outputs)
        .with_context(|| format!("Failed to find testcases in {}", dir.to_string_lossy()))?;
    if testcases.is_empty() {
        log::warn!("No testcases in {}", dir.to_string_lossy());
    }
    Ok(testcases)
}

async fn run_with_spinner(runner: &Runner, cmd: &Cmdline, t: &FsTestcase, output: Option<&Path>) -> Outcome {
    let bar = spinner(format!("Testcase {} ...", t.name()));
    bar.enable_steady_tick(TICK_INTERVAL);
    let res = runner.run(cmd, Some(t.input_path()), output, None).await;
    bar.finish_and_clear();
    res
}

/// Run `cmd` on every testcase in `dir` without judging.
/// With `save`, each output is written to the testcase's `.out`.
pub async fn do_run(runner: &Runner, cmd: &Cmdline, dir: impl AsRef<Path>, save: bool) -> Result<SessionSummary> {
    let testcases = find_testcases(dir.as_ref(), save)?;
    log::info!("Running...");

    let mut summary = SessionSummary {
        total: testcases.len(),
        ..Default::default()
    };
    for t in &testcases {
        let output = if save { t.output_path() } else { None };
        let res = run_with_spinner(runner, cmd, t, output).await;

        if res.verdict == Verdict::Finished {
            log::info!("{} {}", t.name(), style::format_outcome(&res));
            summary.passed += 1;
            summary.slowest = summary.slowest.max(res.time_used);
        } else {
            log::warn!("{} {}", t.name(), style::format_outcome(&res));
            summary.record_failure(res.verdict);
        }
    }

    summary.log();
    Ok(summary)
}

/// Run `cmd` on every testcase in `dir` and judge the outputs, either against
/// the `.out` files or with the special judge `spj`.
pub async fn do_judge(
    runner: &Runner,
    scratch: &Scratch,
    cmd: &Cmdline,
    dir: impl AsRef<Path>,
    spj: Option<&Cmdline>,
) -> Result<SessionSummary> {
    let testcases = find_testcases(dir.as_ref(), false)?;
    log::info!("Running...");

    let output = scratch.path("test.out");
    let judge_files = JudgeFiles::in_dir(scratch.dir());

    let mut summary = SessionSummary {
        total: testcases.len(),
        ..Default::default()
    };
    for t in &testcases {
        let run = run_with_spinner(runner, cmd, t, Some(&output)).await;
        if !run.is_good() {
            log::warn!("{} {}", t.name(), style::format_outcome(&run));
            summary.record_failure(run.verdict);
            continue;
        }

        let res = match (spj, t.output_path()) {
            (Some(spj), _) => {
                let judged = special_judge(runner, spj, t.input_path(), &output, &judge_files).await;
                if !judged.is_good() && judged.verdict != Verdict::WrongAnswer {
                    log::warn!(
                        "{} {}",
                        t.name(),
                        style::format_labelled("Special Judge Error:", &judged)
                    );
                    summary.record_failure(judged.verdict);
                    continue;
                }
                run.judged_by(judged)
            }
            (None, Some(answer)) => run.judged_by(compare(answer, &output)),
            (None, None) => run,
        };

        if res.is_good() {
            log::info!("{} {}", t.name(), style::format_outcome(&res));
            summary.passed += 1;
        } else {
            log::warn!("{} {}", t.name(), style::format_outcome(&res));
            summary.record_failure(res.verdict);
        }
        summary.slowest = summary.slowest.max(res.time_used);
    }

    summary.log();
    Ok(summary)
}

/// Search for an input that breaks `plan.candidate`, saving it into `dir` when found.
pub async fn do_hack(
    runner: &Runner,
    scratch: &Scratch,
    dir: impl AsRef<Path>,
    plan: HackPlan,
) -> Result<(HackReport, Option<SavedTestcase>)> {
    let with_answer = matches!(plan.reference, Reference::Solution(_));
    let files = HackFiles::in_dir(scratch.dir());

    let mut worker = HackWorker::spawn(runner.clone(), plan, files.clone());
    let report = report_progress(&mut worker).await?;

    match report.end {
        HackEnd::GeneratorError => {
            log::warn!("{}", style::format_labelled("Generator Error:", &report.outcome))
        }
        HackEnd::StandardSolutionError => log::warn!(
            "{}",
            style::format_labelled("Standard Solution Error:", &report.outcome)
        ),
        HackEnd::SpecialJudgeError => log::warn!(
            "{}",
            style::format_labelled("Special Judge Error:", &report.outcome)
        ),
        HackEnd::Hacked => log::info!("{}", style::format_outcome(&report.outcome)),
    }

    let attempts = format!(
        " after {} attempt{}",
        report.attempts.to_string().blue(),
        if report.attempts > 1 { "s" } else { "" }
    );
    log::info!("");
    if !report.end.is_hacked() {
        log::info!("{}{}", "Hacking Failed".bright_red().bold(), attempts);
        return Ok((report, None));
    }
    log::info!("{}{}", "Hacking Success".green(), attempts);

    let saved = save_hack_testcase(dir, &files, with_answer)?;
    log::info!("testcase has been saved to:");
    log::info!("{}", fsutil::file_uri(&saved.input)?);
    if let Some(output) = &saved.output {
        log::info!("{}", fsutil::file_uri(output)?);
    }
    log::info!("");
    Ok((report, Some(saved)))
}

async fn report_progress(worker: &mut HackWorker) -> Result<HackReport> {
    let progress = worker.progress();
    let bar = spinner(String::new());
    let mut interval = tokio::time::interval(TICK_INTERVAL);

    let report = loop {
        tokio::select! {
            res = worker.join() => break res,
            _ = interval.tick() => {
                bar.set_message(format!("hacking on testcase #{}...", *progress.borrow()));
                bar.tick();
            }
        }
    };
    bar.finish_and_clear();
    report
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::RunnerConfig;
    use maplit::btreemap;
    use tempfile::TempDir;

    fn sh(script: &str) -> Cmdline {
        Cmdline::shell("/bin/sh", script)
    }

    fn runner() -> Runner {
        Runner::new(
            RunnerConfig::default()
                .time_limit(Duration::from_secs(2))
                .show_stderr(false),
        )
    }

    fn write_testcases(dir: &Path, cases: &[(&str, &str, Option<&str>)]) {
        for (name, input, output) in cases {
            std::fs::write(dir.join(format!("{}.in", name)), input).unwrap();
            if let Some(output) = output {
                std::fs::write(dir.join(format!("{}.out", name)), output).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn run_counts_finished_and_saves_outputs() {
        let dir = TempDir::new().unwrap();
        write_testcases(dir.path(), &[("1", "1\n", None), ("2", "2\n", None), ("3", "x\n", None)]);

        let cmd = sh(r#"read x; [ "$x" != x ] || exit 1; echo $((x * 2))"#);
        let summary = do_run(&runner(), &cmd, dir.path(), true).await.unwrap();
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.total, 3);
        assert!(!summary.all_passed());
        assert_eq!(summary.failures, btreemap! { Verdict::RuntimeError => 1 });
        assert_eq!(std::fs::read_to_string(dir.path().join("2.out")).unwrap(), "4\n");
        assert!(dir.path().join("3.out").is_file());
    }

    #[tokio::test]
    async fn run_without_save_leaves_no_outputs() {
        let dir = TempDir::new().unwrap();
        write_testcases(dir.path(), &[("1", "1\n", None)]);

        let summary = do_run(&runner(), &sh("cat"), dir.path(), false).await.unwrap();
        assert!(summary.all_passed());
        assert!(!dir.path().join("1.out").exists());
    }

    #[tokio::test]
    async fn judge_compares_against_expected_outputs() {
        let dir = TempDir::new().unwrap();
        let scratch = Scratch::new().unwrap();
        write_testcases(
            dir.path(),
            &[
                ("a", "1 2\n", Some("1 2\n")),
                ("b", "3\n", Some("4\n")),
                ("c", "5\n", None),
            ],
        );

        let summary = do_judge(&runner(), &scratch, &sh("cat"), dir.path(), None)
            .await
            .unwrap();
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.failures, btreemap! { Verdict::WrongAnswer => 1 });
    }

    #[tokio::test]
    async fn judge_skips_special_judge_errors() {
        let dir = TempDir::new().unwrap();
        let scratch = Scratch::new().unwrap();
        write_testcases(dir.path(), &[("a", "1\n", None), ("b", "2\n", None), ("c", "3\n", None)]);

        // accepts 1, rejects 2, breaks on 3
        let spj = sh(r#"read n; case $n in 1) exit 0;; 2) exit 1;; *) exit 5;; esac"#);
        let summary = do_judge(&runner(), &scratch, &sh("cat"), dir.path(), Some(&spj))
            .await
            .unwrap();
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.total, 3);
        assert_eq!(
            summary.failures,
            btreemap! { Verdict::WrongAnswer => 1, Verdict::RuntimeError => 1 }
        );
    }

    #[tokio::test]
    async fn missing_testcase_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let res = do_run(&runner(), &sh("cat"), dir.path().join("nope"), false).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn hack_saves_failing_input() {
        let dir = TempDir::new().unwrap();
        let scratch = Scratch::new().unwrap();
        let counter = scratch.path("counter");
        let plan = HackPlan {
            candidate: sh(r#"read x; [ "$x" -lt 2 ] && echo "$x" || echo no"#),
            generator: sh(&format!(
                r#"n=$(cat '{c}' 2>/dev/null || echo 0); n=$((n + 1)); echo $n > '{c}'; echo $n"#,
                c = counter.to_string_lossy()
            )),
            reference: Reference::Solution(sh("cat")),
        };

        let (report, saved) = do_hack(&runner(), &scratch, dir.path(), plan).await.unwrap();
        assert_eq!(report.attempts, 2);
        assert_eq!(report.outcome.verdict, Verdict::WrongAnswer);

        let saved = saved.unwrap();
        assert_eq!(saved.input, dir.path().join("hack_1.in"));
        assert_eq!(std::fs::read_to_string(&saved.input).unwrap(), "2\n");
        assert_eq!(saved.output, Some(dir.path().join("hack_1.out")));
    }

    #[tokio::test]
    async fn failed_hack_saves_nothing() {
        let dir = TempDir::new().unwrap();
        let scratch = Scratch::new().unwrap();
        let plan = HackPlan {
            candidate: sh("cat"),
            generator: sh("exit 1"),
            reference: Reference::SpecialJudge(sh("exit 0")),
        };

        let (report, saved) = do_hack(&runner(), &scratch, dir.path(), plan).await.unwrap();
        assert_eq!(report.end, HackEnd::GeneratorError);
        assert_eq!(saved, None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
