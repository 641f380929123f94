//! Pipeline driver for clipsift: one (video, query) pair in, one
//! highlight reel out.

pub mod config;
pub mod error;
pub mod guard;
pub mod pipeline;

pub use config::RunConfig;
pub use error::{PipelineError, EXIT_ASSEMBLY, EXIT_CONFIG, EXIT_NO_CONTENT, EXIT_RESOURCE, EXIT_SUCCESS, EXIT_TRANSCRIPTION};
pub use guard::{GuardStatus, ResourceGuard};
pub use pipeline::run_pipeline;
