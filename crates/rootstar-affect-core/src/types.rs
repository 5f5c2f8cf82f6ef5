//! Core types for Rootstar Affect
//!
//! This module provides the vocabulary shared by every tier of the affect pipeline:
//! - EEG channel identifiers for the 8-channel headset montage
//! - EEG frequency bands used by spectral models
//! - Circumplex quadrants and the labels built on them
//! - The fixed facial-expression label set with its quadrant mapping and reliability table
//! - Valence/arousal scores and derived metrics

use serde::{Deserialize, Serialize};

use crate::math;

// ============================================================================
// EEG Channels (8-channel montage)
// ============================================================================

/// EEG channel identifiers following the 10-20 system.
///
/// The headset streams 8 channels. Raw frames store their rows in this
/// order, so `channel.index()` is also the row index into a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EegChannel {
    /// Frontal-polar left (prefrontal cortex)
    Fp1 = 0,
    /// Frontal-polar right (prefrontal cortex)
    Fp2 = 1,
    /// Central left
    C3 = 2,
    /// Central right
    C4 = 3,
    /// Parietal left
    P3 = 4,
    /// Parietal right
    P4 = 5,
    /// Occipital left (visual cortex)
    O1 = 6,
    /// Occipital right (visual cortex)
    O2 = 7,
}

impl EegChannel {
    /// All channels in order
    pub const ALL: [Self; 8] = [
        Self::Fp1, Self::Fp2, Self::C3, Self::C4,
        Self::P3, Self::P4, Self::O1, Self::O2,
    ];

    /// Number of channels
    pub const COUNT: usize = 8;

    /// Get the array index for this channel
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Get channel from index (returns None if out of range)
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Fp1),
            1 => Some(Self::Fp2),
            2 => Some(Self::C3),
            3 => Some(Self::C4),
            4 => Some(Self::P3),
            5 => Some(Self::P4),
            6 => Some(Self::O1),
            7 => Some(Self::O2),
            _ => None,
        }
    }

    /// Get the 10-20 system name for this channel
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fp1 => "Fp1",
            Self::Fp2 => "Fp2",
            Self::C3 => "C3",
            Self::C4 => "C4",
            Self::P3 => "P3",
            Self::P4 => "P4",
            Self::O1 => "O1",
            Self::O2 => "O2",
        }
    }
}

// ============================================================================
// EEG Frequency Bands
// ============================================================================

/// Standard EEG frequency band definitions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EegBand {
    /// Delta: 0.5-4 Hz (deep sleep)
    Delta,
    /// Theta: 4-8 Hz (drowsiness, memory)
    Theta,
    /// Alpha: 8-13 Hz (relaxed, eyes closed)
    Alpha,
    /// Beta: 13-30 Hz (active thinking)
    Beta,
    /// Gamma: 30-100 Hz (cognitive processing)
    Gamma,
}

impl EegBand {
    /// Get the frequency range for this band (low, high) in Hz
    #[inline]
    #[must_use]
    pub const fn range_hz(self) -> (f32, f32) {
        match self {
            Self::Delta => (0.5, 4.0),
            Self::Theta => (4.0, 8.0),
            Self::Alpha => (8.0, 13.0),
            Self::Beta => (13.0, 30.0),
            Self::Gamma => (30.0, 100.0),
        }
    }
}

// ============================================================================
// Circumplex Quadrants
// ============================================================================

/// One of the four affect buckets of the valence/arousal circumplex.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    /// High valence, high arousal
    HappyExcited,
    /// Low valence, high arousal
    StressedAngry,
    /// Low valence, low arousal
    SadBored,
    /// High valence, low arousal
    RelaxedCalm,
}

impl Quadrant {
    /// All quadrants in circumplex order
    pub const ALL: [Self; 4] = [
        Self::HappyExcited,
        Self::StressedAngry,
        Self::SadBored,
        Self::RelaxedCalm,
    ];

    /// Classify a point by its offset from the baseline.
    ///
    /// Zero offsets resolve to the high side of each axis.
    #[inline]
    #[must_use]
    pub fn from_offsets(valence_offset: f64, arousal_offset: f64) -> Self {
        match (valence_offset >= 0.0, arousal_offset >= 0.0) {
            (true, true) => Self::HappyExcited,
            (false, true) => Self::StressedAngry,
            (false, false) => Self::SadBored,
            (true, false) => Self::RelaxedCalm,
        }
    }

    /// Human-readable name
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HappyExcited => "Happy / Excited",
            Self::StressedAngry => "Stressed / Angry",
            Self::SadBored => "Sad / Bored",
            Self::RelaxedCalm => "Relaxed / Calm",
        }
    }
}

/// Output label of the quadrant estimator.
///
/// `Calibrating` is a transient state while the subject baseline is being
/// collected; it is never one of the four quadrants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EegLabel {
    /// Baseline still being collected
    Calibrating,
    /// See [`Quadrant::HappyExcited`]
    HappyExcited,
    /// See [`Quadrant::StressedAngry`]
    StressedAngry,
    /// See [`Quadrant::SadBored`]
    SadBored,
    /// See [`Quadrant::RelaxedCalm`]
    RelaxedCalm,
}

impl EegLabel {
    /// The quadrant behind this label, if calibrated
    #[inline]
    #[must_use]
    pub const fn quadrant(self) -> Option<Quadrant> {
        match self {
            Self::Calibrating => None,
            Self::HappyExcited => Some(Quadrant::HappyExcited),
            Self::StressedAngry => Some(Quadrant::StressedAngry),
            Self::SadBored => Some(Quadrant::SadBored),
            Self::RelaxedCalm => Some(Quadrant::RelaxedCalm),
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.quadrant() {
            Some(q) => q.name(),
            None => "Calibrating...",
        }
    }
}

impl From<Quadrant> for EegLabel {
    fn from(q: Quadrant) -> Self {
        match q {
            Quadrant::HappyExcited => Self::HappyExcited,
            Quadrant::StressedAngry => Self::StressedAngry,
            Quadrant::SadBored => Self::SadBored,
            Quadrant::RelaxedCalm => Self::RelaxedCalm,
        }
    }
}

// ============================================================================
// Facial Expressions
// ============================================================================

/// Fixed 8-label expression set produced by the face classifier.
///
/// The discriminant is the index into an [`ExpressionProbs`] vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Expression {
    /// anger
    Anger = 0,
    /// contempt
    Contempt = 1,
    /// disgust
    Disgust = 2,
    /// fear
    Fear = 3,
    /// happy
    Happy = 4,
    /// neutral
    Neutral = 5,
    /// sad
    Sad = 6,
    /// surprise
    Surprise = 7,
}

/// Probability vector over [`Expression::ALL`].
pub type ExpressionProbs = [f64; Expression::COUNT];

impl Expression {
    /// All labels in classifier output order
    pub const ALL: [Self; 8] = [
        Self::Anger, Self::Contempt, Self::Disgust, Self::Fear,
        Self::Happy, Self::Neutral, Self::Sad, Self::Surprise,
    ];

    /// Number of labels
    pub const COUNT: usize = 8;

    /// Index into a probability vector
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Label from a probability-vector index
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Lowercase label name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Anger => "anger",
            Self::Contempt => "contempt",
            Self::Disgust => "disgust",
            Self::Fear => "fear",
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Sad => "sad",
            Self::Surprise => "surprise",
        }
    }

    /// Circumplex quadrant this expression collapses onto
    #[must_use]
    pub const fn quadrant(self) -> Quadrant {
        match self {
            Self::Happy | Self::Surprise => Quadrant::HappyExcited,
            Self::Anger | Self::Fear | Self::Contempt => Quadrant::StressedAngry,
            Self::Sad | Self::Disgust => Quadrant::SadBored,
            Self::Neutral => Quadrant::RelaxedCalm,
        }
    }

    /// Measured per-label accuracy of the face classifier, used as a trust weight.
    ///
    /// Posed expressions such as "happy" are easy to produce; "neutral" is
    /// both accurate and hard to fake.
    #[must_use]
    pub const fn reliability(self) -> f64 {
        match self {
            Self::Anger => 0.39,
            Self::Contempt => 0.25,
            Self::Disgust => 0.14,
            Self::Fear => 0.41,
            Self::Happy => 0.71,
            Self::Neutral => 0.75,
            Self::Sad => 0.33,
            Self::Surprise => 0.42,
        }
    }
}

// ============================================================================
// Scores and Metrics
// ============================================================================

/// Valence/arousal pair produced by an EEG model, both nominally in [0, 1].
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EegScore {
    /// Predicted positivity of affect
    pub valence: f64,
    /// Predicted activation of affect
    pub arousal: f64,
}

impl EegScore {
    /// Create a new score
    #[must_use]
    pub const fn new(valence: f64, arousal: f64) -> Self {
        Self { valence, arousal }
    }

    /// Replace non-finite values with 0.0 and clamp both axes to [0, 1]
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            valence: math::sanitize_unit(self.valence),
            arousal: math::sanitize_unit(self.arousal),
        }
    }
}

/// Psychological metrics derived from the latest EEG score.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EegMetrics {
    /// Valence in [0, 1]
    pub valence: f64,
    /// Arousal in [0, 1]
    pub arousal: f64,
    /// `(1 - valence) * arousal`, in [0, 1]
    pub stress: f64,
}

impl EegMetrics {
    /// Build metrics from a raw score; the score is sanitised first
    #[must_use]
    pub fn from_score(score: EegScore) -> Self {
        let s = score.sanitized();
        Self {
            valence: s.valence,
            arousal: s.arousal,
            stress: math::stress(s.valence, s.arousal),
        }
    }
}
