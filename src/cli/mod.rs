//! Native CLI support for the depgen binary.

pub mod args;
pub mod config;
pub mod driver;
pub mod fs;
pub mod reporter;
pub mod watch;

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod args_tests;
#[cfg(test)]
#[path = "tests/reporter_tests.rs"]
mod reporter_tests;
