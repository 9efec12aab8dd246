//! Non-fatal problems recorded while composing a scene

use crate::role::Role;
use std::path::PathBuf;
use thiserror::Error;

/// A recoverable failure. None of these stop composition; the affected
/// object is missing, untextured, unrotated or unscaled instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    #[error("failed to load {role} geometry from {path:?}: {message}")]
    LoadFailure {
        role: Role,
        path: PathBuf,
        message: String,
    },

    #[error("failed to load texture {path:?}, using flat tint: {message}")]
    TextureFailure { path: PathBuf, message: String },

    #[error("unknown rotation token {token:?} for {role}, skipped")]
    MalformedOrientationToken { role: Role, token: String },

    #[error("invalid scale for {role} {path:?}, using (1, 1, 1)")]
    MalformedScaleSpec { role: Role, path: PathBuf },

    #[error("control group {name:?} does not exist, object added at scene root")]
    UnknownControlGroup { name: String },

    #[error("load of {path:?} completed after the viewer was torn down, discarded")]
    DisposalRace { path: PathBuf },
}

impl Diagnostic {
    /// Short category name, stable for matching in hosts and tests
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::LoadFailure { .. } => "LoadFailure",
            Diagnostic::TextureFailure { .. } => "TextureFailure",
            Diagnostic::MalformedOrientationToken { .. } => "MalformedOrientationToken",
            Diagnostic::MalformedScaleSpec { .. } => "MalformedScaleSpec",
            Diagnostic::UnknownControlGroup { .. } => "UnknownControlGroup",
            Diagnostic::DisposalRace { .. } => "DisposalRace",
        }
    }
}
