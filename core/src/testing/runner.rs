use std::{
    ffi::{OsStr, OsString},
    fmt,
    fs::File,
    io,
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use nix::{
    errno::Errno,
    sys::signal::{killpg, Signal},
    unistd::Pid,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, BufReader},
    process::{Child, Command},
    time::Instant,
};

use super::result::*;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmdline {
    program: OsString,
    args: Vec<OsString>,
}

impl Cmdline {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `<shell> -c <script>`
    pub fn shell(shell: impl Into<OsString>, script: impl AsRef<OsStr>) -> Self {
        Self::new(shell).arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for Cmdline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub time_limit: Duration,
    pub special_time_limit: Duration,
    pub show_stderr: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            time_limit: Self::DEFAULT_TIME_LIMIT,
            special_time_limit: Self::SPECIAL_TIME_LIMIT_FLOOR,
            show_stderr: true,
        }
    }
}

impl RunnerConfig {
    pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(1);
    pub const SPECIAL_TIME_LIMIT_FLOOR: Duration = Duration::from_secs(60);

    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn special_time_limit(mut self, limit: Duration) -> Self {
        self.special_time_limit = limit;
        self
    }

    pub fn show_stderr(mut self, show: bool) -> Self {
        self.show_stderr = show;
        self
    }
}

/// How a spawned process ended, before any verdict is assigned.
#[derive(Debug)]
pub(crate) enum Execution {
    /// Refused before spawning (missing or undecodable input).
    Rejected(Outcome),
    Exited {
        status: ExitStatus,
        elapsed: Duration,
    },
    TimedOut {
        limit: Duration,
    },
    Failed(io::Error),
}

#[derive(Debug, Clone)]
pub struct Runner {
    cfg: RunnerConfig,
}

impl Runner {
    const ENCODING_CHECK_BYTES: u64 = 64 * 1024;

    pub fn new(cfg: RunnerConfig) -> Self {
        Self { cfg }
    }

    /// Limit for generators, reference solutions and special judges.
    pub fn special_time_limit(&self) -> Duration {
        self.cfg.time_limit.max(self.cfg.special_time_limit)
    }

    /// Run `cmd` with `input` as stdin and `output` as stdout.
    /// `None` binds the stream to the null device.
    pub async fn run(
        &self,
        cmd: &Cmdline,
        input: Option<&Path>,
        output: Option<&Path>,
        time_limit: Option<Duration>,
    ) -> Outcome {
        let limit = time_limit.unwrap_or(self.cfg.time_limit);
        match self.execute(cmd, input, output, limit).await {
            Execution::Rejected(outcome) => outcome,
            Execution::Exited { status, elapsed } if status.success() => {
                Outcome::with_time(Verdict::Finished, elapsed)
            }
            Execution::Exited { status, elapsed } => Outcome {
                time_used: elapsed,
                ..Outcome::with_message(Verdict::RuntimeError, describe_failure(cmd, status))
            },
            Execution::TimedOut { limit } => Outcome::with_time(Verdict::TimeLimitExceeded, limit),
            Execution::Failed(e) => Outcome::with_message(
                Verdict::UnknownError,
                format!("Failed to run '{}': {}", cmd, e),
            ),
        }
    }

    pub async fn special_run(
        &self,
        cmd: &Cmdline,
        input: Option<&Path>,
        output: Option<&Path>,
    ) -> Outcome {
        self.run(cmd, input, output, Some(self.special_time_limit()))
            .await
    }

    pub(crate) async fn execute(
        &self,
        cmd: &Cmdline,
        input: Option<&Path>,
        output: Option<&Path>,
        limit: Duration,
    ) -> Execution {
        let stdin = match input {
            Some(path) => {
                if let Some(rejected) = Self::check_input(path).await {
                    return Execution::Rejected(rejected);
                }
                match File::open(path) {
                    Ok(f) => Stdio::from(f),
                    Err(e) => return Execution::Rejected(io_outcome(path, e)),
                }
            }
            None => Stdio::null(),
        };

        // File::create makes sure the output exists before redirecting into it.
        let stdout = match output {
            Some(path) => match File::create(path) {
                Ok(f) => Stdio::from(f),
                Err(e) => return Execution::Failed(e),
            },
            None => Stdio::null(),
        };

        let stderr = if self.cfg.show_stderr {
            Stdio::inherit()
        } else {
            Stdio::null()
        };

        let start_at = Instant::now();
        let mut proc = match cmd
            .to_command()
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr)
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
        {
            Ok(proc) => proc,
            Err(e) => return Execution::Failed(e),
        };
        let mut group = ProcessGroup::led_by(&proc);
        log::debug!("Spawned '{}' (limit={}ms)", cmd, limit.as_millis());

        match tokio::time::timeout(limit, proc.wait()).await {
            Err(_) => {
                group.kill();
                proc.kill()
                    .await
                    .unwrap_or_else(|e| log::warn!("Failed to kill TLE process: {:#}", e));
                Execution::TimedOut { limit }
            }
            Ok(Err(e)) => Execution::Failed(e),
            Ok(Ok(status)) => Execution::Exited {
                status,
                elapsed: start_at.elapsed(),
            },
        }
    }

    /// Reads the first line of `input`, which has to be UTF-8 text.
    async fn check_input(input: &Path) -> Option<Outcome> {
        let file = match tokio::fs::File::open(input).await {
            Ok(f) => f,
            Err(e) => return Some(io_outcome(input, e)),
        };
        let mut reader = BufReader::new(file.take(Self::ENCODING_CHECK_BYTES));
        let mut line = Vec::new();
        if let Err(e) = reader.read_until(b'\n', &mut line).await {
            return Some(io_outcome(input, e));
        }

        match std::str::from_utf8(&line) {
            Ok(_) => None,
            // A multibyte char cut off by the byte limit is fine.
            Err(e) if e.error_len().is_none() => None,
            Err(_) => Some(Outcome::with_message(
                Verdict::UnknownFileEncoding,
                input.to_string_lossy(),
            )),
        }
    }
}

/// The process group a child was spawned into. Whatever is left of it is
/// killed on drop, so programs started by `<shell> -c` never outlive their run.
struct ProcessGroup(Option<Pid>);

impl ProcessGroup {
    fn led_by(child: &Child) -> Self {
        Self(child.id().map(|id| Pid::from_raw(id as i32)))
    }

    fn kill(&mut self) {
        let Some(pgid) = self.0.take() else {
            return
        };
        match killpg(pgid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => log::warn!("Failed to kill process group {}: {}", pgid, e),
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

pub(crate) fn io_outcome(path: &Path, e: io::Error) -> Outcome {
    let verdict = match e.kind() {
        io::ErrorKind::NotFound => Verdict::FileNotFound,
        io::ErrorKind::InvalidData => Verdict::UnknownFileEncoding,
        _ => Verdict::UnknownError,
    };
    Outcome::with_message(verdict, format!("{}: {}", path.to_string_lossy(), e))
}

pub(crate) fn describe_failure(cmd: &Cmdline, status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("Command '{}' returned non-zero exit status {}", cmd, code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return format!("Command '{}' died with signal {}", cmd, signal);
        }
    }
    format!("Command '{}' terminated abnormally", cmd)
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    struct X {
        input: &'static [u8],
        script: &'static str,
        time_limit: Duration,
        want_verdict: Verdict,
        want_stdout: Option<&'static str>,
    }

    async fn run_test(x: X) -> Outcome {
        let dir = TempDir::new().unwrap();
        let (input, output) = (dir.path().join("a.in"), dir.path().join("a.out"));
        std::fs::write(&input, x.input).unwrap();

        let runner = Runner::new(RunnerConfig::default().show_stderr(false));
        let cmd = Cmdline::shell("/bin/sh", x.script);

        let res = dbg!(
            runner
                .run(&cmd, Some(&input), Some(&output), Some(x.time_limit))
                .await
        );
        assert_eq!(res.verdict, x.want_verdict);
        if let Some(want) = x.want_stdout {
            assert_eq!(std::fs::read_to_string(&output).unwrap(), want);
        }
        res
    }

    #[tokio::test]
    async fn should_be_finished() {
        let res = run_test(X {
            input: b"123\n",
            script: r#"read x; echo "hello_$x""#,
            time_limit: Duration::from_secs(5),
            want_verdict: Verdict::Finished,
            want_stdout: Some("hello_123\n"),
        })
        .await;
        assert!(res.time_used < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn should_be_finished_even_if_stdin_is_not_read() {
        run_test(X {
            input: b"123\n",
            script: "echo hello_123",
            time_limit: Duration::from_secs(5),
            want_verdict: Verdict::Finished,
            want_stdout: Some("hello_123\n"),
        })
        .await;
    }

    #[tokio::test]
    async fn should_be_re_even_if_stdout_is_correct() {
        let res = run_test(X {
            input: b"123\n",
            script: "echo hello_123; exit 42",
            time_limit: Duration::from_secs(5),
            want_verdict: Verdict::RuntimeError,
            want_stdout: Some("hello_123\n"),
        })
        .await;
        assert!(res.message.contains("exit status 42"), "{}", res.message);
    }

    #[tokio::test]
    async fn should_be_tle_with_time_equal_to_limit() {
        let limit = Duration::from_millis(300);
        let res = run_test(X {
            input: b"123\n",
            script: "exec sleep 3",
            time_limit: limit,
            want_verdict: Verdict::TimeLimitExceeded,
            want_stdout: None,
        })
        .await;
        assert_eq!(res.time_used, limit);
    }

    #[tokio::test]
    async fn undecodable_input_is_rejected_before_spawning() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("spawned");
        let input = dir.path().join("bin.in");
        std::fs::write(&input, [0xff, 0xfe, 0x00, 0x80, b'\n']).unwrap();

        let runner = Runner::new(RunnerConfig::default());
        let cmd = Cmdline::new("touch").arg(&marker);
        let res = runner.run(&cmd, Some(&input), None, None).await;

        assert_eq!(res.verdict, Verdict::UnknownFileEncoding);
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn missing_input_is_file_not_found() {
        let dir = TempDir::new().unwrap();
        let runner = Runner::new(RunnerConfig::default());
        let res = runner
            .run(
                &Cmdline::new("true"),
                Some(&dir.path().join("nope.in")),
                None,
                None,
            )
            .await;
        assert_eq!(res.verdict, Verdict::FileNotFound);
    }

    #[tokio::test]
    async fn output_file_is_created_even_if_nothing_is_printed() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("empty.out");
        let runner = Runner::new(RunnerConfig::default());
        let res = runner.run(&Cmdline::new("true"), None, Some(&output), None).await;
        assert_eq!(res.verdict, Verdict::Finished);
        assert_eq!(std::fs::read(&output).unwrap(), b"");
    }

    #[tokio::test]
    async fn unknown_program_is_unknown_error() {
        let runner = Runner::new(RunnerConfig::default());
        let cmd = Cmdline::new("/nonexistent/definitely-not-a-program");
        let res = runner.run(&cmd, None, None, None).await;
        assert_eq!(res.verdict, Verdict::UnknownError);
        assert!(!res.message.is_empty());
    }

    #[test]
    fn special_time_limit_has_floor() {
        let r = Runner::new(RunnerConfig::default().time_limit(Duration::from_secs(2)));
        assert_eq!(r.special_time_limit(), Duration::from_secs(60));

        let r = Runner::new(RunnerConfig::default().time_limit(Duration::from_secs(90)));
        assert_eq!(r.special_time_limit(), Duration::from_secs(90));
    }

    #[tokio::test]
    async fn tle_kills_programs_started_by_the_shell() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("late.out");
        let runner = Runner::new(RunnerConfig::default().show_stderr(false));
        let cmd = Cmdline::shell("/bin/sh", "/bin/sh -c 'sleep 1; echo late'; true");

        let res = runner
            .run(&cmd, None, Some(&output), Some(Duration::from_millis(200)))
            .await;
        assert_eq!(res.verdict, Verdict::TimeLimitExceeded);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
    }

    #[tokio::test]
    async fn background_jobs_die_with_the_program() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("bg.out");
        let runner = Runner::new(RunnerConfig::default().show_stderr(false));
        let cmd = Cmdline::shell("/bin/sh", "(sleep 1; echo late) & echo now");

        let res = runner.run(&cmd, None, Some(&output), None).await;
        assert_eq!(res.verdict, Verdict::Finished);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "now\n");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn hidden_stderr_goes_to_null_device() {
        let script = r#"[ "$(readlink /proc/$$/fd/2)" = /dev/null ]"#;
        let cmd = Cmdline::shell("/bin/sh", script);

        let runner = Runner::new(RunnerConfig::default().show_stderr(false));
        assert_eq!(runner.run(&cmd, None, None, None).await.verdict, Verdict::Finished);
    }

    #[test]
    fn cmdline_display() {
        let cmd = Cmdline::shell("/bin/sh", "./a.out").arg("x").arg("y");
        assert_eq!(cmd.to_string(), "/bin/sh -c ./a.out x y");
    }
}
