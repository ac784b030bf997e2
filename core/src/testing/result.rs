use std::{fmt, time::Duration};

/// Classification of one judged attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumIter,
)]
pub enum Verdict {
    #[strum(serialize = "Accepted")]
    Accepted,

    /// Ran successfully but nothing judged the output.
    #[strum(serialize = "Finished")]
    Finished,

    #[strum(serialize = "Wrong Answer")]
    WrongAnswer,

    #[strum(serialize = "Compile Error")]
    CompileError,

    #[strum(serialize = "Runtime Error")]
    RuntimeError,

    #[strum(serialize = "Time Limit Exceeded")]
    TimeLimitExceeded,

    #[strum(serialize = "Memory Limit Exceeded")]
    MemoryLimitExceeded,

    #[strum(serialize = "Unknown Error")]
    UnknownError,

    #[strum(serialize = "Unknown File Type")]
    UnknownFileType,

    #[strum(serialize = "Unknown File Encoding")]
    UnknownFileEncoding,

    #[strum(serialize = "No Such File Or Directory")]
    FileNotFound,
}

impl Verdict {
    pub fn is_good(self) -> bool {
        matches!(self, Verdict::Accepted | Verdict::Finished)
    }

    pub fn code(self) -> &'static str {
        use Verdict::*;
        match self {
            Accepted => "AC",
            Finished => "OK",
            WrongAnswer => "WA",
            CompileError => "CE",
            RuntimeError => "RE",
            TimeLimitExceeded => "TLE",
            MemoryLimitExceeded => "MLE",
            UnknownError => "UKE",
            UnknownFileType => "UFT",
            UnknownFileEncoding => "UFE",
            FileNotFound => "NF",
        }
    }
}

/// Result of one execution or comparison step.
///
/// Outcomes are never mutated; a derived outcome is built from the parts of
/// existing ones (see [`Outcome::judged_by`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub verdict: Verdict,
    pub message: String,
    pub time_used: Duration,
    /// Reserved. Nothing measures memory yet.
    pub memory_used: u64,
}

impl Outcome {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            message: String::new(),
            time_used: Duration::ZERO,
            memory_used: 0,
        }
    }

    pub fn with_message(verdict: Verdict, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::new(verdict)
        }
    }

    pub fn with_time(verdict: Verdict, time_used: Duration) -> Self {
        Self {
            time_used,
            ..Self::new(verdict)
        }
    }

    pub fn is_good(&self) -> bool {
        self.verdict.is_good()
    }

    /// Verdict and message of `judgement`, resource usage of `self`.
    pub fn judged_by(&self, judgement: Outcome) -> Self {
        Self {
            verdict: judgement.verdict,
            message: judgement.message,
            time_used: self.time_used,
            memory_used: self.memory_used,
        }
    }

    pub fn time_millis(&self) -> u128 {
        self.time_used.as_millis()
    }

    /// Message on a single line.
    pub fn folded_message(&self) -> String {
        self.message.trim_end().replace('\n', " ")
    }

    /// Whether the execution time is worth printing next to the verdict.
    pub fn shows_time(&self) -> bool {
        use Verdict::*;
        matches!(self.verdict, Accepted | Finished | WrongAnswer)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verdict)?;
        if !self.message.is_empty() {
            write!(f, " {}", self.folded_message())?;
        }
        if self.shows_time() {
            write!(f, " Executed in {} ms", self.time_millis())?;
        }
        Ok(())
    }
}
