// Library surface for the session engine, shared by the binary and the
// headless integration tests. Terminal rendering stays in the binary.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod controller;
pub mod differ;
pub mod error;
pub mod heatmap;
pub mod metrics;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod store;
pub mod text;
pub mod time_series;

pub use controller::{InputOutcome, SessionController};
pub use error::{ConfigError, EngineError, StoreError, TextError};
pub use session::{Difficulty, ErrorCountPolicy, SessionConfig, SessionPhase, SessionResult};
