//! Orientation strings: comma separated sequences of quarter turns
//!
//! Each token names the scan axis that should end up pointing "up" and maps
//! to one fixed quarter turn about a *different* local axis:
//!
//! | token | rotation              |
//! |-------|-----------------------|
//! | `x`   | -90° about local Z    |
//! | `-x`  | +90° about local Z    |
//! | `y`   | -90° about local X    |
//! | `-y`  | +90° about local X    |
//! | `z`   | -90° about local Y    |
//! | `-z`  | +90° about local Y    |

use plyscene_core::{Axis, ObjectTransform, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use std::str::FromStr;

/// One quarter turn of an orientation sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrientationStep {
    X,
    NegX,
    Y,
    NegY,
    Z,
    NegZ,
}

impl OrientationStep {
    /// Local axis and angle this step rotates by
    pub fn rotation(self) -> (Axis, f32) {
        match self {
            Self::X => (Axis::Z, -FRAC_PI_2),
            Self::NegX => (Axis::Z, FRAC_PI_2),
            Self::Y => (Axis::X, -FRAC_PI_2),
            Self::NegY => (Axis::X, FRAC_PI_2),
            Self::Z => (Axis::Y, -FRAC_PI_2),
            Self::NegZ => (Axis::Y, FRAC_PI_2),
        }
    }

    pub fn quaternion(self) -> UnitQuaternion<f32> {
        let (axis, angle) = self.rotation();
        UnitQuaternion::from_axis_angle(&axis.unit(), angle)
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::NegX => "-x",
            Self::Y => "y",
            Self::NegY => "-y",
            Self::Z => "z",
            Self::NegZ => "-z",
        }
    }
}

/// A token that names no axis
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rotation token: {0:?}")]
pub struct UnknownToken(pub String);

impl FromStr for OrientationStep {
    type Err = UnknownToken;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.trim().to_lowercase().as_str() {
            "x" => Ok(Self::X),
            "-x" => Ok(Self::NegX),
            "y" => Ok(Self::Y),
            "-y" => Ok(Self::NegY),
            "z" => Ok(Self::Z),
            "-z" => Ok(Self::NegZ),
            _ => Err(UnknownToken(token.trim().to_string())),
        }
    }
}

/// A parsed orientation string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrientationSpec {
    steps: Vec<OrientationStep>,
    skipped: Vec<String>,
}

impl OrientationSpec {
    /// Parse a comma separated orientation string.
    ///
    /// Unknown tokens are collected in [`skipped`](Self::skipped) rather than
    /// failing the parse. Empty tokens (as in `""` or `"x,,z"`) are ignored.
    pub fn parse(spec: &str) -> Self {
        let mut parsed = Self::default();

        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.parse::<OrientationStep>() {
                Ok(step) => parsed.steps.push(step),
                Err(UnknownToken(token)) => parsed.skipped.push(token),
            }
        }

        parsed
    }

    pub fn steps(&self) -> &[OrientationStep] {
        &self.steps
    }

    /// Tokens that were not recognised, in input order
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// The composed rotation: each step is applied in the frame produced by
    /// the steps before it.
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.steps
            .iter()
            .fold(UnitQuaternion::identity(), |acc, step| acc * step.quaternion())
    }

    /// Reset `transform`'s rotation, then apply each step in order
    pub fn apply(&self, transform: &mut ObjectTransform) {
        transform.reset_rotation();
        for step in &self.steps {
            let (axis, angle) = step.rotation();
            transform.rotate_local(axis, angle);
        }
    }
}

impl std::fmt::Display for OrientationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tokens: Vec<&str> = self.steps.iter().map(|s| s.token()).collect();
        f.write_str(&tokens.join(","))
    }
}

/// Parse `spec` and apply it to `transform`, warning about skipped tokens.
///
/// Prior rotation is always discarded first, so calling this twice with the
/// same string gives the same result.
pub fn apply_orientation(transform: &mut ObjectTransform, spec: &str) -> OrientationSpec {
    let parsed = OrientationSpec::parse(spec);

    for token in parsed.skipped() {
        log::warn!("Unknown rotation: {:?}. Skipping.", token);
    }

    parsed.apply(transform);
    log::debug!("Applied orientation {:?} as [{}]", spec, parsed);
    parsed
}
