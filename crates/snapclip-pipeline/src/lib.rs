//! Clip selection and multi-aspect export pipeline.
//!
//! Turns one input video into short clips centered on scene changes (or
//! evenly spaced moments), each exported in portrait, square and landscape
//! framing.

pub mod config;
pub mod dedup;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod selection;
pub mod window;

pub use config::{FailurePolicy, PipelineConfig};
pub use dedup::dedup_spans;
pub use error::{PipelineError, PipelineResult};
pub use logging::{init_tracing, RunLogger};
pub use orchestrator::{
    generate_clips, ClipPipeline, GenerateRequest, RenderFailure, RunReport, SpanPlan,
};
pub use selection::select_candidates;
pub use window::build_window;
