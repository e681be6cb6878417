//! CLI command implementations
//!
//! Every radio command takes the opened [`RadioHandle`](crate::programmers::RadioHandle)
//! by mutable reference and runs exactly one bracketed exchange, except
//! `set-freq --check`, which reads the tuning range first.

mod cs_test;
mod list;
mod query;
mod tune;

pub use cs_test::run_cs_test;
pub use list::list_programmers;
pub use query::{run_frequency_range, run_temperature, run_text_query};
pub use tune::{run_aprs, run_memory, run_set_frequency};
