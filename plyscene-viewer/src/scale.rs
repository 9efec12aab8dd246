//! Scale inputs: a uniform number or a per-axis structure

use plyscene_core::{ObjectTransform, Vector3};
use serde::{de::IgnoredAny, Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Per-axis scale; a missing axis means 1
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisScale {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

/// Scale as supplied by the host.
///
/// Deserialises from a number, an `{x, y, z}` object with optional members,
/// or anything else, which becomes [`ScaleSpec::Invalid`]. Arrays are not
/// per-axis input.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "ScaleInput")]
pub enum ScaleSpec {
    Uniform(f32),
    PerAxis(AxisScale),
    Invalid,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScaleInput {
    Uniform(f32),
    // Only objects; a derived struct would also take `[x, y, z]`
    PerAxis(Map<String, Value>),
    Other(IgnoredAny),
}

/// Read one axis of an `{x, y, z}` object. `Err` for non-numeric members.
fn axis_member(members: &Map<String, Value>, key: &str) -> Result<Option<f32>, ()> {
    match members.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(|v| Some(v as f32)).ok_or(()),
        Some(_) => Err(()),
    }
}

impl From<ScaleInput> for ScaleSpec {
    fn from(input: ScaleInput) -> Self {
        match input {
            ScaleInput::Uniform(s) => ScaleSpec::Uniform(s),
            ScaleInput::PerAxis(members) => {
                let axes = (
                    axis_member(&members, "x"),
                    axis_member(&members, "y"),
                    axis_member(&members, "z"),
                );
                match axes {
                    (Ok(x), Ok(y), Ok(z)) => ScaleSpec::per_axis(x, y, z),
                    _ => ScaleSpec::Invalid,
                }
            }
            ScaleInput::Other(_) => ScaleSpec::Invalid,
        }
    }
}

impl Serialize for ScaleSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScaleSpec::Uniform(s) => serializer.serialize_f32(*s),
            ScaleSpec::PerAxis(axes) => axes.serialize(serializer),
            ScaleSpec::Invalid => serializer.serialize_none(),
        }
    }
}

impl Default for ScaleSpec {
    fn default() -> Self {
        ScaleSpec::Uniform(1.0)
    }
}

impl From<f32> for ScaleSpec {
    fn from(scale: f32) -> Self {
        ScaleSpec::Uniform(scale)
    }
}

impl ScaleSpec {
    pub fn per_axis(x: Option<f32>, y: Option<f32>, z: Option<f32>) -> Self {
        ScaleSpec::PerAxis(AxisScale { x, y, z })
    }

    /// The scale vector this input describes, or `None` if it is malformed.
    /// Non-finite components count as malformed.
    pub fn resolve(&self) -> Option<Vector3<f32>> {
        let scale = match *self {
            ScaleSpec::Uniform(s) => Vector3::new(s, s, s),
            ScaleSpec::PerAxis(AxisScale { x, y, z }) => {
                Vector3::new(x.unwrap_or(1.0), y.unwrap_or(1.0), z.unwrap_or(1.0))
            }
            ScaleSpec::Invalid => return None,
        };
        scale.iter().all(|c| c.is_finite()).then_some(scale)
    }
}

/// Result of applying a scale input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleOutcome {
    Applied(Vector3<f32>),
    /// The input was malformed; identity scale was set instead
    Fallback,
}

impl ScaleOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ScaleOutcome::Fallback)
    }
}

/// Set `transform`'s scale from `spec`, falling back to (1, 1, 1) with a
/// warning when the input is malformed. Never fails.
pub fn apply_scale(transform: &mut ObjectTransform, spec: &ScaleSpec) -> ScaleOutcome {
    match spec.resolve() {
        Some(scale) => {
            transform.set_scale(scale);
            log::debug!("Applied scale: x={}, y={}, z={}", scale.x, scale.y, scale.z);
            ScaleOutcome::Applied(scale)
        }
        None => {
            log::warn!("Invalid scale value {:?}, using default scale of 1", spec);
            transform.set_uniform_scale(1.0);
            ScaleOutcome::Fallback
        }
    }
}
