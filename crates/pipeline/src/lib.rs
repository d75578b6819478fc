//! The streaming conversion pipeline: bounded-concurrency scheduling of
//! build-and-upload work over a lazy record source, plus the sequential
//! batched harvest runner and the run report.

mod harvest;
mod scheduler;
mod serializer;
mod sink;
mod stats;

pub use harvest::{run_harvest, HarvestOptions};
pub use scheduler::{run_conversion, PipelineOptions, SourceFailure};
pub use serializer::{BuildError, InProcessSerializer, SerializerWorker, ThreadPoolSerializer};
pub use sink::ArcSink;
pub use stats::RunStats;
