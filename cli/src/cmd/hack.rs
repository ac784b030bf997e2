use std::path::PathBuf;

use jdg_core::testing::{HackPlan, Reference};
use jdg_core::{action, toolchain::Toolchain, Scratch};

use super::{GlobalArgs, SubcmdResult, TestArgs};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub test: TestArgs,

    /// Generator printing one random input per run
    #[arg(short = 'g', long)]
    pub generator: PathBuf,

    #[command(flatten)]
    pub reference: ReferenceArgs,
}

#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
pub struct ReferenceArgs {
    /// Trusted solution to compare outputs with
    #[arg(short = 's', long = "std")]
    pub standard: Option<PathBuf>,

    /// Special judge to check outputs with
    #[arg(long)]
    pub spj: Option<PathBuf>,
}

pub async fn exec(args: &Args, global: &GlobalArgs, scratch: &Scratch) -> SubcmdResult {
    let cfg = global.load_config()?;
    let toolchain = Toolchain::new(&cfg, scratch.dir());

    let candidate = super::prepare(&toolchain, &args.test.file, "test").await?;
    let generator = super::prepare(&toolchain, &args.generator, "gen").await?;
    let reference = match (&args.reference.standard, &args.reference.spj) {
        (Some(file), _) => Reference::Solution(super::prepare(&toolchain, file, "std").await?),
        (None, Some(file)) => Reference::SpecialJudge(super::prepare(&toolchain, file, "spj").await?),
        (None, None) => anyhow::bail!("Either --std or --spj is required"),
    };

    let plan = HackPlan {
        candidate,
        generator,
        reference,
    };
    let runner = args.test.runner(&cfg, global);
    action::do_hack(&runner, scratch, &args.test.testcase_dir, plan).await?;
    Ok(())
}
