use colored::{Color, ColoredString, Colorize};

use crate::testing::{Outcome, Verdict};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for log::Level {
    fn color(&self) -> Color {
        use log::Level::*;
        match self {
            Error => Color::BrightRed,
            Warn => Color::BrightYellow,
            Info => Color::Cyan,
            Debug => Color::Magenta,
            Trace => Color::Blue,
        }
    }
}

impl ColorTheme for Verdict {
    fn color(&self) -> Color {
        use Verdict::*;
        if !self::is_truecolor_supported() {
            return match self {
                Accepted | Finished => Color::Green,
                WrongAnswer => Color::Yellow,
                TimeLimitExceeded | MemoryLimitExceeded => Color::Red,
                RuntimeError => Color::Magenta,
                CompileError => Color::Blue,
                _ => Color::BrightBlack,
            };
        }

        let (r, g, b) = match self {
            Accepted | Finished => (30, 180, 40),
            WrongAnswer => (210, 138, 4),
            TimeLimitExceeded | MemoryLimitExceeded => (220, 42, 42),
            RuntimeError => (171, 40, 200),
            CompileError => (40, 110, 210),
            _ => (120, 120, 120),
        };
        Color::TrueColor { r, g, b }
    }
}

/// Short code of the verdict on a coloured background, e.g. ` WA `.
pub fn verdict_badge(verdict: Verdict) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", verdict.code())
        .on_color(verdict.color())
        .bold()
        .color(fg)
}

/// Coloured rendering of [`Outcome`]'s `Display`.
pub fn format_outcome(outcome: &Outcome) -> String {
    let mut s = outcome
        .verdict
        .to_string()
        .color(outcome.verdict.color())
        .bold()
        .to_string();
    if !outcome.message.is_empty() {
        s.push(' ');
        s.push_str(&outcome.folded_message());
    }
    if outcome.shows_time() {
        s += &format!(" Executed in {} ms", outcome.time_millis())
            .dimmed()
            .to_string();
    }
    s
}

/// `<label> <outcome>`, for outcomes of something other than the candidate.
pub fn format_labelled(label: &str, outcome: &Outcome) -> String {
    format!("{} {}", label.bright_red().bold(), format_outcome(outcome))
}
