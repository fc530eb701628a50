//! Integration tests for confidence tiers and routing bands

use ferpa_feedback::core::pipeline::ConfidenceThresholds;
use ferpa_feedback::domain::{ConfidenceTier, RouteDecision};
use test_case::test_case;

#[test_case(90.0, 70.0, 40.0 ; "custom cut points")]
#[test_case(95.0, 80.0, 50.0 ; "default cut points")]
#[test_case(80.0, 80.0, 10.0 ; "review equals accept")]
fn test_every_score_has_one_tier_and_band(accept: f64, review: f64, reject: f64) {
    let thresholds = ConfidenceThresholds::new(accept, review, reject).unwrap();

    for step in 0..=1000 {
        let score = f64::from(step) / 10.0;
        let tier = thresholds.tier(score);
        let band = thresholds.band(score);

        match tier {
            ConfidenceTier::High => assert!(score >= accept),
            ConfidenceTier::Medium => assert!(score >= review && score < accept),
            ConfidenceTier::Low => assert!(score < review),
        }
        match band {
            RouteDecision::AutoAccepted => assert_eq!(tier, ConfidenceTier::High),
            RouteDecision::NeedsReview => assert!(score >= reject && score < accept),
            RouteDecision::AutoRejected => assert!(score < reject),
        }
    }
}

#[test_case(90.0 => RouteDecision::AutoAccepted ; "accept boundary is inclusive")]
#[test_case(89.99 => RouteDecision::NeedsReview)]
#[test_case(40.0 => RouteDecision::NeedsReview ; "reject boundary stays in review")]
#[test_case(39.99 => RouteDecision::AutoRejected)]
#[test_case(f64::NAN => RouteDecision::NeedsReview ; "nan lands in review")]
fn test_band_boundaries(score: f64) -> RouteDecision {
    ConfidenceThresholds::new(90.0, 70.0, 40.0).unwrap().band(score)
}

#[test_case(101.0, 80.0, 50.0 ; "accept above range")]
#[test_case(95.0, 50.0, 50.0 ; "reject equals review")]
#[test_case(70.0, 80.0, 50.0 ; "review above accept")]
#[test_case(95.0, 80.0, -1.0 ; "reject below range")]
fn test_invalid_thresholds_rejected(accept: f64, review: f64, reject: f64) {
    assert!(ConfidenceThresholds::new(accept, review, reject).is_err());
}
