//! Callback-driven geometry and texture sources
//!
//! A source accepts a path plus a [`LoadRequest`] and later resolves the
//! request exactly once. Sources never resolve a request from inside `load`;
//! the host drives them cooperatively (see [`PlyFileSource::process_pending`]).

use crate::error::IoError;
use crate::ply::PlyReader;
use crate::texture::TextureImage;
use plyscene_core::RawGeometry;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

type ProgressFn = Box<dyn FnMut(f32)>;
type CompleteFn<T> = Box<dyn FnOnce(Result<T, IoError>)>;

/// A pending fetch: progress reports plus a one-shot completion
pub struct LoadRequest<T> {
    on_progress: Option<ProgressFn>,
    on_complete: CompleteFn<T>,
}

impl<T> LoadRequest<T> {
    pub fn new<F>(on_complete: F) -> Self
    where
        F: FnOnce(Result<T, IoError>) + 'static,
    {
        Self {
            on_progress: None,
            on_complete: Box::new(on_complete),
        }
    }

    pub fn with_progress<F>(mut self, on_progress: F) -> Self
    where
        F: FnMut(f32) + 'static,
    {
        self.on_progress = Some(Box::new(on_progress));
        self
    }

    /// Report transfer progress; the fraction is clamped to [0, 1]
    pub fn progress(&mut self, fraction: f32) {
        if let Some(on_progress) = self.on_progress.as_mut() {
            on_progress(fraction.clamp(0.0, 1.0));
        }
    }

    /// Resolve the request, consuming it
    pub fn complete(self, result: Result<T, IoError>) {
        (self.on_complete)(result)
    }
}

impl<T> std::fmt::Debug for LoadRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadRequest")
            .field("has_progress", &self.on_progress.is_some())
            .finish_non_exhaustive()
    }
}

/// Yields raw geometry for a path
pub trait GeometrySource {
    fn load(&mut self, path: &Path, request: LoadRequest<RawGeometry>);
}

/// Yields decoded textures for a path
pub trait TextureSource {
    fn load(&mut self, path: &Path, request: LoadRequest<TextureImage>);
}

/// Reads PLY files from disk, one queued request per cooperative step
#[derive(Debug, Default)]
pub struct PlyFileSource {
    pending: VecDeque<(PathBuf, LoadRequest<RawGeometry>)>,
}

impl PlyFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Resolve the oldest queued request. Returns false when idle.
    pub fn process_next(&mut self) -> bool {
        let Some((path, mut request)) = self.pending.pop_front() else {
            return false;
        };

        request.progress(0.0);
        let result = PlyReader::read_geometry(&path);
        if result.is_ok() {
            request.progress(1.0);
        }
        request.complete(result);
        true
    }

    /// Resolve every queued request, returning how many were resolved
    pub fn process_pending(&mut self) -> usize {
        let mut resolved = 0;
        while self.process_next() {
            resolved += 1;
        }
        resolved
    }
}

impl GeometrySource for PlyFileSource {
    fn load(&mut self, path: &Path, request: LoadRequest<RawGeometry>) {
        log::debug!("Queued geometry load: {}", path.display());
        self.pending.push_back((path.to_path_buf(), request));
    }
}

/// Decodes image files from disk, one queued request per cooperative step
#[derive(Debug, Default)]
pub struct ImageTextureSource {
    pending: VecDeque<(PathBuf, LoadRequest<TextureImage>)>,
}

impl ImageTextureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn process_pending(&mut self) -> usize {
        let mut resolved = 0;
        while let Some((path, request)) = self.pending.pop_front() {
            request.complete(TextureImage::open(&path));
            resolved += 1;
        }
        resolved
    }
}

impl TextureSource for ImageTextureSource {
    fn load(&mut self, path: &Path, request: LoadRequest<TextureImage>) {
        log::debug!("Queued texture load: {}", path.display());
        self.pending.push_back((path.to_path_buf(), request));
    }
}

/// Holds requests until the caller resolves them explicitly, in any order
pub struct ManualSource<T> {
    pending: Vec<(PathBuf, LoadRequest<T>)>,
}

impl<T> ManualSource<T> {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    pub fn pending_paths(&self) -> Vec<PathBuf> {
        self.pending.iter().map(|(path, _)| path.clone()).collect()
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        self.pending.iter().any(|(p, _)| p == path)
    }

    /// Report progress on the first pending request for `path`
    pub fn progress(&mut self, path: &Path, fraction: f32) -> bool {
        match self.pending.iter_mut().find(|(p, _)| p == path) {
            Some((_, request)) => {
                request.progress(fraction);
                true
            }
            None => false,
        }
    }

    /// Resolve the first pending request for `path`. Returns false if none.
    pub fn resolve(&mut self, path: &Path, result: Result<T, IoError>) -> bool {
        match self.pending.iter().position(|(p, _)| p == path) {
            Some(index) => {
                let (_, request) = self.pending.remove(index);
                request.complete(result);
                true
            }
            None => false,
        }
    }
}

impl<T> Default for ManualSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometrySource for ManualSource<RawGeometry> {
    fn load(&mut self, path: &Path, request: LoadRequest<RawGeometry>) {
        self.pending.push((path.to_path_buf(), request));
    }
}

impl TextureSource for ManualSource<TextureImage> {
    fn load(&mut self, path: &Path, request: LoadRequest<TextureImage>) {
        self.pending.push((path.to_path_buf(), request));
    }
}
