/*!
 * Tests for the fallback duration estimator
 */

use voxline::app_config::EstimatorConfig;
use voxline::estimator::DurationEstimator;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_estimate_withClauseAndSentence_shouldAddBothPauses() {
    let estimator = DurationEstimator::default();
    // 6 mora, one clause pause, one sentence pause
    assert_close(estimator.estimate("はい、そうです。"), 6.0 / 7.5 + 0.15 + 0.35);
}

#[test]
fn test_estimate_withTerminatorRun_shouldCountOnePause() {
    let estimator = DurationEstimator::default();
    // Two kanji at two units each
    assert_close(estimator.estimate("本当！？"), 4.0 / 7.5 + 0.35);
}

#[test]
fn test_estimate_withDecimalNumber_shouldNotPause() {
    let estimator = DurationEstimator::default();
    // Nine latin characters at 0.4 units
    assert_close(estimator.estimate("Version 3.5"), 9.0 * 0.4 / 7.5);
}

#[test]
fn test_estimate_withEmptyText_shouldReturnMinimum() {
    let estimator = DurationEstimator::default();
    assert_close(estimator.estimate(""), 0.3);
    assert_close(estimator.estimate("「」"), 0.3);
}

#[test]
fn test_estimate_shouldBePositiveAndMonotonicInLength() {
    let estimator = DurationEstimator::default();
    let short = estimator.estimate("新しいモデル");
    let long = estimator.estimate("新しいモデルが発表された");

    assert!(short > 0.0);
    assert!(long > short);
    assert_eq!(estimator.estimate("新しいモデル"), short);
}

#[test]
fn test_fromConfig_withZeroMinimum_shouldStillBeAboveZero() {
    let config = EstimatorConfig {
        min_seconds: 0.0,
        ..EstimatorConfig::default()
    };
    let estimator = DurationEstimator::from_config(&config);

    let seconds = estimator.estimate("");
    assert!(seconds > 0.0);
    assert!((seconds * 1000.0).round() >= 1.0);
}

#[test]
fn test_fromConfig_withFasterRate_shouldShortenEstimates() {
    let slow = DurationEstimator::default();
    let fast = DurationEstimator::from_config(&EstimatorConfig {
        units_per_second: 15.0,
        ..EstimatorConfig::default()
    });

    let text = "きょうはいいてんきですね";
    assert!(fast.estimate(text) < slow.estimate(text));
    assert_close(fast.phonetic_units(text), slow.phonetic_units(text));
}
