use std::path::PathBuf;

use jdg_core::{action, toolchain::Toolchain, Scratch};

use super::{GlobalArgs, SubcmdResult, TestArgs};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub test: TestArgs,

    /// Special judge used instead of comparing with `.out` files
    #[arg(long)]
    pub spj: Option<PathBuf>,
}

pub async fn exec(args: &Args, global: &GlobalArgs, scratch: &Scratch) -> SubcmdResult {
    let cfg = global.load_config()?;
    let toolchain = Toolchain::new(&cfg, scratch.dir());

    let cmd = super::prepare(&toolchain, &args.test.file, "test").await?;
    let spj = match &args.spj {
        Some(file) => Some(super::prepare(&toolchain, file, "spj").await?),
        None => None,
    };

    let runner = args.test.runner(&cfg, global);
    action::do_judge(&runner, scratch, &cmd, &args.test.testcase_dir, spj.as_ref()).await?;
    Ok(())
}
