//! Claim records to prometheus gauge samples.

pub mod materializer;
pub mod sample;

pub use materializer::Materializer;
pub use sample::{MetricSample, SampleLabels};
