use super::sample::{
    Emotion, EngagementSample, EngagementScores, EngagementState, SampleSource,
};
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;

/// Synthesize a plausible sample: four nonnegative draws rescaled to 100,
/// with uniformly chosen state and emotion labels.
pub fn synthesize_sample<R: Rng + ?Sized>(rng: &mut R, source: SampleSource) -> EngagementSample {
    let raw = EngagementScores {
        concentrated: rng.gen_range(30.0..70.0),
        engaged: rng.gen_range(30.0..70.0),
        confused: rng.gen_range(10.0..40.0),
        bored: rng.gen_range(10.0..40.0),
    };

    let total = raw.total();
    let scores = EngagementScores {
        concentrated: raw.concentrated / total * 100.0,
        engaged: raw.engaged / total * 100.0,
        confused: raw.confused / total * 100.0,
        bored: raw.bored / total * 100.0,
    };

    let state = *EngagementState::ALL
        .choose(rng)
        .unwrap_or(&EngagementState::Concentrated);
    let emotion = *Emotion::ALL.choose(rng).unwrap_or(&Emotion::Neutral);

    EngagementSample {
        scores,
        state,
        emotion,
        source,
        captured_at: Utc::now(),
    }
}

/// Local sample from the thread RNG
pub fn synthesize() -> EngagementSample {
    synthesize_sample(&mut rand::thread_rng(), SampleSource::Local)
}
