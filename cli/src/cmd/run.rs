use jdg_core::{action, toolchain::Toolchain, Scratch};

use super::{GlobalArgs, SubcmdResult, TestArgs};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    pub test: TestArgs,

    /// Save each output to the `.out` file of its testcase
    #[arg(short = 's', long)]
    pub save: bool,
}

pub async fn exec(args: &Args, global: &GlobalArgs, scratch: &Scratch) -> SubcmdResult {
    let cfg = global.load_config()?;
    let toolchain = Toolchain::new(&cfg, scratch.dir());
    let cmd = super::prepare(&toolchain, &args.test.file, "test").await?;

    let runner = args.test.runner(&cfg, global);
    action::do_run(&runner, &cmd, &args.test.testcase_dir, args.save).await?;
    Ok(())
}
