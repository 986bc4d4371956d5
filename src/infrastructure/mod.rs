pub mod process_runner;

pub use process_runner::{ExternalCommand, ProcessHandle, ProcessOutcome, ProcessRunner, ProcessStatus};
