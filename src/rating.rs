//! Elo rating update (logistic expected score, integer ratings).

/// Returns the new `(rating_a, rating_b)` for a finished match.
///
/// `score_a` is 1.0 for a win, 0.0 for a loss, 0.5 for a draw, and
/// `score_a + score_b == 1.0`. New ratings are truncated toward zero, so a
/// win between equal opponents at K=32 moves each side by exactly 16.
pub fn update(rating_a: i32, rating_b: i32, score_a: f64, score_b: f64, k: f64) -> (i32, i32) {
    let expected_a = 1.0 / (1.0 + 10f64.powf((rating_b - rating_a) as f64 / 400.0));
    let expected_b = 1.0 - expected_a;
    let new_a = rating_a as f64 + k * (score_a - expected_a);
    let new_b = rating_b as f64 + k * (score_b - expected_b);
    (new_a as i32, new_b as i32)
}
