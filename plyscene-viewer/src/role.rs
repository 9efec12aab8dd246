//! Named roles a model can play in a scene

use serde::{Deserialize, Serialize};

/// What a model is for in the composed scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The only model of a single-model viewer
    #[default]
    Model,
    /// Fixed backdrop the other objects sit in
    Room,
    /// Object of interest, usually placed in its own control group
    Subject,
}

impl Role {
    /// Backdrop objects get a slightly glossier surface
    pub fn is_backdrop(self) -> bool {
        matches!(self, Role::Room)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Model => "model",
            Role::Room => "room",
            Role::Subject => "subject",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
