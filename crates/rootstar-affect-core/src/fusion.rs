//! Rule-based EEG + face fusion
//!
//! Late fusion of the EEG quadrant with the smoothed facial expression.
//! The policy is an ordered rule list so every decision can be traced back
//! to the rule that produced it:
//!
//! 1. **Dissonance**: the face shows "happy" while EEG reads low valence and
//!    low arousal. Flagged as a likely social (performed) smile.
//! 2. **Agreement**: the face quadrant equals the EEG quadrant.
//! 3. **Conflict**: trust the camera only if the expression's reliability
//!    exceeds [`CAMERA_TRUST_THRESHOLD`]; otherwise trust the EEG.
//!
//! Fusion needs both streams; if either is absent the result is `Standby`.

use serde::{Deserialize, Serialize};

use crate::smoothing::SmoothedExpression;
use crate::types::{Expression, Quadrant};

/// Confidence reported when a dissonance is flagged
pub const DISSONANCE_CONFIDENCE: f64 = 0.45;

/// Confidence reported when both modalities agree
pub const SYNCED_CONFIDENCE: f64 = 0.95;

/// Confidence reported while waiting for both modalities
pub const STANDBY_CONFIDENCE: f64 = 0.5;

/// Reliability above which the camera wins a conflict
pub const CAMERA_TRUST_THRESHOLD: f64 = 0.6;

/// How the two modalities related this tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FusionStatus {
    /// Face and EEG agree
    Synced,
    /// Face and EEG disagree; the more reliable one won
    MixedSignals,
    /// Face presents positive affect over a low-valence EEG reading
    DissonanceDetected,
    /// At least one modality has no current reading
    Standby,
}

impl FusionStatus {
    /// Human-readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Synced => "Synced",
            Self::MixedSignals => "Mixed Signals",
            Self::DissonanceDetected => "Dissonance Detected",
            Self::Standby => "Standby",
        }
    }
}

/// Final label of a fusion decision.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FusionLabel {
    /// Waiting for both modalities
    Standby,
    /// Performed smile over a bored/sad brain state
    SocialSmileBored,
    /// See [`Quadrant::HappyExcited`]
    HappyExcited,
    /// See [`Quadrant::StressedAngry`]
    StressedAngry,
    /// See [`Quadrant::SadBored`]
    SadBored,
    /// See [`Quadrant::RelaxedCalm`]
    RelaxedCalm,
}

impl FusionLabel {
    /// Human-readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standby => "STANDBY",
            Self::SocialSmileBored => "Social Smile / Bored",
            Self::HappyExcited => Quadrant::HappyExcited.name(),
            Self::StressedAngry => Quadrant::StressedAngry.name(),
            Self::SadBored => Quadrant::SadBored.name(),
            Self::RelaxedCalm => Quadrant::RelaxedCalm.name(),
        }
    }
}

impl From<Quadrant> for FusionLabel {
    fn from(q: Quadrant) -> Self {
        match q {
            Quadrant::HappyExcited => Self::HappyExcited,
            Quadrant::StressedAngry => Self::StressedAngry,
            Quadrant::SadBored => Self::SadBored,
            Quadrant::RelaxedCalm => Self::RelaxedCalm,
        }
    }
}

/// Outcome of one fusion step.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FusionDecision {
    /// Fused affect label
    pub final_label: FusionLabel,
    /// Relationship between the modalities
    pub status: FusionStatus,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Whether the facial expression is judged performed
    pub is_fake: bool,
}

impl FusionDecision {
    /// Decision used when either modality is missing
    pub const STANDBY: Self = Self {
        final_label: FusionLabel::Standby,
        status: FusionStatus::Standby,
        confidence: STANDBY_CONFIDENCE,
        is_fake: false,
    };
}

impl Default for FusionDecision {
    fn default() -> Self {
        Self::STANDBY
    }
}

/// Fuse the EEG quadrant with the smoothed facial reading.
///
/// `None` on either side means "no valid reading this tick".
#[must_use]
pub fn fuse(eeg: Option<Quadrant>, face: Option<&SmoothedExpression>) -> FusionDecision {
    let (Some(eeg), Some(face)) = (eeg, face) else {
        return FusionDecision::STANDBY;
    };
    let expression = face.dominant;
    let face_quadrant = expression.quadrant();

    if expression == Expression::Happy && eeg == Quadrant::SadBored {
        return FusionDecision {
            final_label: FusionLabel::SocialSmileBored,
            status: FusionStatus::DissonanceDetected,
            confidence: DISSONANCE_CONFIDENCE,
            is_fake: true,
        };
    }

    if face_quadrant == eeg {
        return FusionDecision {
            final_label: eeg.into(),
            status: FusionStatus::Synced,
            confidence: SYNCED_CONFIDENCE,
            is_fake: false,
        };
    }

    let reliability = expression.reliability();
    let winner = if reliability > CAMERA_TRUST_THRESHOLD {
        face_quadrant
    } else {
        eeg
    };
    FusionDecision {
        final_label: winner.into(),
        status: FusionStatus::MixedSignals,
        confidence: reliability,
        is_fake: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn face(e: Expression) -> SmoothedExpression {
        let mut probs = [0.0; 8];
        probs[e.index()] = 1.0;
        SmoothedExpression::from_probs(probs)
    }

    #[test]
    fn test_dissonance() {
        let d = fuse(Some(Quadrant::SadBored), Some(&face(Expression::Happy)));
        assert_eq!(d.status, FusionStatus::DissonanceDetected);
        assert_eq!(d.final_label, FusionLabel::SocialSmileBored);
        assert!(d.is_fake);
        assert_eq!(d.confidence, 0.45);
    }

    #[test]
    fn test_sync() {
        for e in Expression::ALL {
            let d = fuse(Some(e.quadrant()), Some(&face(e)));
            assert_eq!(d.status, FusionStatus::Synced);
            assert_eq!(d.confidence, 0.95);
            assert_eq!(d.final_label, FusionLabel::from(e.quadrant()));
            assert!(!d.is_fake);
        }
    }

    #[test]
    fn test_reliable_face_wins_conflict() {
        let d = fuse(Some(Quadrant::StressedAngry), Some(&face(Expression::Neutral)));
        assert_eq!(d.status, FusionStatus::MixedSignals);
        assert_eq!(d.final_label, FusionLabel::RelaxedCalm);
        assert_eq!(d.confidence, 0.75);
    }

    #[test]
    fn test_unreliable_face_defers_to_eeg() {
        let d = fuse(Some(Quadrant::RelaxedCalm), Some(&face(Expression::Disgust)));
        assert_eq!(d.status, FusionStatus::MixedSignals);
        assert_eq!(d.final_label, FusionLabel::RelaxedCalm);
        assert_eq!(d.confidence, 0.14);
    }

    #[test]
    fn test_happy_over_stress_is_conflict_not_dissonance() {
        let d = fuse(Some(Quadrant::StressedAngry), Some(&face(Expression::Happy)));
        assert_eq!(d.status, FusionStatus::MixedSignals);
        assert_eq!(d.final_label, FusionLabel::HappyExcited);
        assert!(!d.is_fake);
    }

    #[test]
    fn test_standby() {
        assert_eq!(fuse(None, Some(&face(Expression::Happy))), FusionDecision::STANDBY);
        assert_eq!(fuse(Some(Quadrant::SadBored), None), FusionDecision::STANDBY);
        assert_eq!(fuse(None, None).confidence, 0.5);
    }

    proptest! {
        #[test]
        fn prop_absent_modality_is_standby(q in 0usize..4, e in 0usize..8, eeg_missing: bool) {
            let f = face(Expression::ALL[e]);
            let d = if eeg_missing {
                fuse(None, Some(&f))
            } else {
                fuse(Some(Quadrant::ALL[q]), None)
            };
            prop_assert_eq!(d.status, FusionStatus::Standby);
            prop_assert_eq!(d.confidence, STANDBY_CONFIDENCE);
            prop_assert!(!d.is_fake);
        }

        #[test]
        fn prop_confidence_in_unit_range(q in 0usize..4, e in 0usize..8) {
            let d = fuse(Some(Quadrant::ALL[q]), Some(&face(Expression::ALL[e])));
            prop_assert!((0.0..=1.0).contains(&d.confidence));
        }
    }
}
