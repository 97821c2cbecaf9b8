//! # taal_runner
//!
//! Subprocess execution layer for taal.
//!
//! Commands are described as a program plus an argument vector and an
//! explicit environment. Nothing is interpreted by a shell and nothing is
//! inherited from the parent environment.
//!
//! # Features
//!
//! - **Process Runner**: tokio-based child processes with separate stdout/stderr capture
//! - **Environment Isolation**: the child sees only the variables it is given
//! - **Dry-Run Mode**: Log commands without execution
//! - **Optional Timeout**: Kill the child after a deadline
//! - **Mock Runner**: For testing without the real executable
//!
//! # Example
//!
//! ```rust,no_run
//! use taal_runner::{CommandRunner, CommandSpec, ProcessRunner, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = ProcessRunner::default();
//!
//!     let spec = CommandSpec::new("terraform")
//!         .args(["version", "-no-color"])
//!         .env("PATH", std::env::var("PATH").unwrap_or_default());
//!
//!     let result = runner.run(&spec, &RunConfig::default()).await?;
//!     println!("Exit code: {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mock;
pub mod process;
pub mod runner;

pub use config::{CommandSpec, RunConfig};
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockHook, MockResponse, MockRunner};
pub use process::{ProcessRunner, ProcessRunnerOptions};
pub use runner::{CommandRunner, ExecutionResult};
