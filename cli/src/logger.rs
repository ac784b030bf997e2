use std::io::Write as _;

use colored::Colorize as _;
use jdg_core::style::ColorTheme as _;

/// `[LEVEL] message` on stderr. `RUST_LOG` takes precedence over `debug`.
pub fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let level = record.level();
            writeln!(
                buf,
                "[{}] {}",
                level.to_string().color(level.color()).bold(),
                record.args()
            )
        })
        .init();
}
