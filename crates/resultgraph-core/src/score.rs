//! Weighted result scores.
//!
//! Scores are a pure function of the backend's cached raw components and the
//! active [`ScoreWeights`], so switching presets is a cheap full recompute.

use crate::config::ScoreWeights;
use crate::model::{ResultRecord, ResultScore, Score, ScoreComponents};

/// Combine raw components into `{main, secondary}`.
///
/// `main` is the weight-normalized mean of the three components; `secondary`
/// is the raw confidence, used to break ties. Missing components score zero.
pub fn generate_score(components: Option<&ScoreComponents>, weights: &ScoreWeights) -> Score {
    let Some(c) = components else {
        return Score::default();
    };
    let total = weights.total();
    let main = if total > 0.0 {
        (c.confidence * weights.confidence_weight
            + c.novelty * weights.novelty_weight
            + c.clinical * weights.clinical_weight)
            / total
    } else {
        0.0
    };
    Score {
        main,
        secondary: c.confidence,
    }
}

/// Recompute the score of one result.
///
/// Pathfinder scores (plain numbers) are left as the backend sent them, as
/// are results without raw components.
pub fn rescore(result: &mut ResultRecord, weights: &ScoreWeights) {
    if matches!(result.score, Some(ResultScore::Plain(_))) {
        return;
    }
    if result.scores.is_none() && result.score.is_some() {
        return;
    }
    result.score = Some(ResultScore::Weighted(generate_score(
        result.scores.as_ref(),
        weights,
    )));
}

pub fn rescore_results(results: &mut [ResultRecord], weights: &ScoreWeights) {
    for result in results.iter_mut() {
        rescore(result, weights);
    }
}
