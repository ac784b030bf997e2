pub mod compare;
pub mod hack;
pub mod result;
pub mod runner;
pub mod special;
pub mod testcase;

pub use compare::compare;
pub use hack::{HackEnd, HackFiles, HackPlan, HackReport, HackWorker, Reference};
pub use result::*;
pub use runner::{Cmdline, Runner, RunnerConfig};
pub use special::{special_judge, JudgeFiles};
pub use testcase::FsTestcase;
