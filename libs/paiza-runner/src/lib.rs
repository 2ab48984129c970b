pub mod client;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod session;


pub use client::{run_and_wait, PaizaClient, RunnerApi};
pub use error::{Result, RunnerError};
pub use executor::{run_all, EventSink};
pub use session::{SessionRun, Target, TestSession};
