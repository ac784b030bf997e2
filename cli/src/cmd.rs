pub mod hack;
pub mod init;
pub mod judge;
pub mod run;

use std::path::{Path, PathBuf};
use std::time::Duration;

use jdg_core::testing::{Cmdline, Runner, RunnerConfig};
use jdg_core::toolchain::Toolchain;
use jdg_core::{style, Config, Scratch};

use crate::util;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Show debug logs and full error chains
    #[arg(long, global = true)]
    pub debug: bool,

    /// Do not pass through stderr of tested programs
    #[arg(long, global = true)]
    pub hide_stderr: bool,

    /// Config file to use instead of the nearest jdg.toml
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    /// Judge a program against the testcases
    #[command(alias("j"))]
    Judge(judge::Args),

    /// Run a program on the testcases without judging
    #[command(alias("r"))]
    Run(run::Args),

    /// Search for an input on which a program fails
    #[command(alias("h"))]
    Hack(hack::Args),

    /// Write the default jdg.toml
    Init(init::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self, scratch: &Scratch) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Judge(args) => judge::exec(args, self, scratch).await,
            Run(args) => run::exec(args, self, scratch).await,
            Hack(args) => hack::exec(args, self, scratch).await,
            Init(args) => init::exec(args, self),
        }
    }

    pub fn load_config(&self) -> anyhow::Result<Config> {
        Config::load(self.config.clone(), util::current_dir())
    }
}

/// Arguments shared by the subcommands that run a program on testcases.
#[derive(Debug, clap::Args)]
pub struct TestArgs {
    /// Source file of the program to test
    #[arg()]
    pub file: PathBuf,

    /// Time limit in seconds
    #[arg(short = 't', long, default_value = "1", value_parser = parse_seconds)]
    pub time_limit: Duration,

    #[arg(short = 'd', long, default_value = "testcases")]
    pub testcase_dir: PathBuf,
}

impl TestArgs {
    pub fn runner(&self, cfg: &Config, global: &GlobalArgs) -> Runner {
        Runner::new(
            RunnerConfig::default()
                .time_limit(self.time_limit)
                .special_time_limit(cfg.special_time_limit.into())
                .show_stderr(cfg.show_stderr && !global.hide_stderr),
        )
    }
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("must be a positive number of seconds: {}", s));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Compile `file` if needed and return how to run it.
pub async fn prepare(toolchain: &Toolchain<'_>, file: &Path, role: &str) -> anyhow::Result<Cmdline> {
    match toolchain.prepare(file, role).await {
        Ok(cmd) => Ok(cmd),
        Err(e) => {
            log::error!("{} {}", file.to_string_lossy(), style::format_outcome(&e.outcome()));
            anyhow::bail!("Failed to prepare {}", file.to_string_lossy())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[test]
    fn verify_cli() {
        GlobalArgs::command().debug_assert();
    }

    #[test]
    fn judge_defaults() {
        let app = GlobalArgs::try_parse_from(["jdg", "j", "main.cpp"]).unwrap();
        let Subcommand::Judge(args) = app.subcmd else {
            panic!("expected judge");
        };
        assert_eq!(args.test.file, Path::new("main.cpp"));
        assert_eq!(args.test.time_limit, Duration::from_secs(1));
        assert_eq!(args.test.testcase_dir, Path::new("testcases"));
        assert_eq!(args.spj, None);
        assert!(!app.debug);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let app = GlobalArgs::try_parse_from([
            "jdg", "run", "a.py", "-t", "2.5", "--save", "--hide-stderr", "--debug",
        ])
        .unwrap();
        assert!(app.debug);
        assert!(app.hide_stderr);
        let Subcommand::Run(args) = app.subcmd else {
            panic!("expected run");
        };
        assert!(args.save);
        assert_eq!(args.test.time_limit, Duration::from_millis(2500));
    }

    #[test]
    fn hack_needs_exactly_one_reference() {
        let ok = GlobalArgs::try_parse_from(["jdg", "hack", "a.cpp", "-g", "gen.py", "-s", "std.cpp"]);
        assert!(ok.is_ok());
        let ok = GlobalArgs::try_parse_from(["jdg", "hack", "a.cpp", "-g", "gen.py", "--spj", "chk.cpp"]);
        assert!(ok.is_ok());

        let none = GlobalArgs::try_parse_from(["jdg", "hack", "a.cpp", "-g", "gen.py"]);
        assert!(none.is_err());
        let both = GlobalArgs::try_parse_from([
            "jdg", "hack", "a.cpp", "-g", "gen.py", "-s", "std.cpp", "--spj", "chk.cpp",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn time_limit_must_be_positive() {
        assert!(parse_seconds("0").is_err());
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("abc").is_err());
        assert_eq!(parse_seconds("0.5"), Ok(Duration::from_millis(500)));
    }
}
