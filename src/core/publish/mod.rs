//! Guarded publish of the data bundle.
//!
//! latch → sync → config → generate → validate → stage → diff → commit → push.
//! Nothing with a side effect runs before the latch passes, and a run whose
//! staged bundle matches `HEAD` ends without a commit.

pub mod config;
mod generator;
pub mod latch;
pub mod message;
mod pipeline;
mod types;
pub mod validate;

pub use config::{MarkerCheck, PublishConfig, PublishSettings, Variant};
pub use generator::{ExternalGenerator, Generator, NativeGenerator};
pub use pipeline::Publisher;
pub use types::{PublishCommit, PublishRun, PublishStage, PublishStatus};
pub use validate::{check_bundle, BundleCheck};
