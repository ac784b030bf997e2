pub mod action;
pub mod config;
pub mod scratch;
pub mod str_interp;
pub mod style;
pub mod testing;
pub mod toolchain;

pub use crate::config::Config;
pub use crate::scratch::Scratch;
