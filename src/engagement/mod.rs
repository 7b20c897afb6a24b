//! Engagement samples and periodic sampling

mod sample;
mod sampler;
mod synth;

pub use sample::{Emotion, EngagementSample, EngagementScores, EngagementState, SampleSource};
pub use sampler::{EngagementSampler, LatestSample};
pub use synth::{synthesize, synthesize_sample};
