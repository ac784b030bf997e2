use std::path::PathBuf;

use anyhow::{ensure, Context as _};
use jdg_core::{print_success, Config};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(default_value = "./")]
    dir: PathBuf,
}

pub fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let path = args.dir.join(Config::FILENAME);
    ensure!(!path.exists(), "Already exists: {}", path.to_string_lossy());

    fsutil::write_with_mkdir(&path, Config::example_toml())
        .context("Failed to write config file")?;
    print_success!("Successfully created {}", path.to_string_lossy());
    Ok(())
}
