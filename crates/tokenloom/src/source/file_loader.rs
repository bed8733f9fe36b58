//! Token file discovery and reading.
//!
//! Sources are directories (walked recursively) or single files. Every
//! discovered file gets a resolution name: its path relative to the source
//! root, with forward slashes. Names drive the canonical file ordering: files
//! of a layer are always merged in lexicographic name order, whatever order
//! the filesystem lists them in.
//!
//! | Source | File | Name |
//! |--------|------|------|
//! | `tokens/ref` | `tokens/ref/color.json` | `tokens/ref/color.json` |
//! | `tokens/ref` | `tokens/ref/palette/brand.tokens.json` | `tokens/ref/palette/brand.tokens.json` |
//!
//! Reading is the only I/O-bound part of a build, so files are read on
//! scoped threads. Results are collected by index, which keeps the output
//! independent of which read finishes first.

use std::path::{Path, PathBuf};
use std::thread;

use crate::error::{BuildError, Result};
use crate::store::{Layer, LayerKind, SourceFile};

use super::parser::parse_token_file;

/// Recognized token file extensions.
pub const TOKEN_EXTENSIONS: &[&str] = &[".tokens.json", ".json"];

/// A token file discovered during directory walking, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    /// Display name used for ordering and diagnostics.
    pub name: String,
    /// Filesystem path for reading content.
    pub path: PathBuf,
}

impl LoadedFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Collects the token files of one source (directory or file).
///
/// `label` is the source as written in the configuration; names are built
/// from it so diagnostics point at recognizable paths.
pub fn discover(source: &Path, label: &str) -> Result<Vec<LoadedFile>> {
    if source.is_file() {
        return Ok(vec![LoadedFile::new(normalize(label), source)]);
    }
    if !source.is_dir() {
        return Err(BuildError::io(source, "token source not found"));
    }

    let mut files = Vec::new();
    walk_dir_recursive(source, source, label, &mut files)?;
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

fn walk_dir_recursive(
    current: &Path,
    root: &Path,
    label: &str,
    files: &mut Vec<LoadedFile>,
) -> Result<()> {
    let entries = std::fs::read_dir(current).map_err(|e| BuildError::io(current, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(current, e))?;
        let path = entry.path();

        if path.is_dir() {
            walk_dir_recursive(&path, root, label, files)?;
        } else if path.is_file() {
            if let Some(file) = try_parse_file(&path, root, label) {
                files.push(file);
            }
        }
    }
    Ok(())
}

/// Returns `None` for files without a recognized extension.
fn try_parse_file(path: &Path, root: &Path, label: &str) -> Option<LoadedFile> {
    let path_str = path.to_string_lossy();
    TOKEN_EXTENSIONS
        .iter()
        .find(|ext| path_str.ends_with(*ext))?;

    let relative = path.strip_prefix(root).ok()?;
    let relative = normalize(&relative.to_string_lossy());
    let name = format!("{}/{}", normalize(label).trim_end_matches('/'), relative);
    Some(LoadedFile::new(name, path))
}

fn normalize(name: &str) -> String {
    name.replace(std::path::MAIN_SEPARATOR, "/")
}

/// Reads and parses files concurrently, returning them in input order.
///
/// The first failing file (in input order) is reported.
pub fn read_sources(files: &[LoadedFile]) -> Result<Vec<SourceFile>> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(files.len());
    let chunk_size = files.len().div_ceil(workers);

    let results = thread::scope(|scope| {
        let handles: Vec<_> = files
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || chunk.iter().map(read_one).collect::<Vec<_>>()))
            .collect();

        let mut results = Vec::with_capacity(files.len());
        for (handle, chunk) in handles.into_iter().zip(files.chunks(chunk_size)) {
            match handle.join() {
                Ok(batch) => results.extend(batch),
                Err(_) => {
                    results.push(Err(BuildError::io(
                        &chunk[0].path,
                        "reader thread panicked",
                    )));
                }
            }
        }
        results
    });

    results.into_iter().collect()
}

fn read_one(file: &LoadedFile) -> Result<SourceFile> {
    let content = std::fs::read_to_string(&file.path).map_err(|e| BuildError::io(&file.path, e))?;
    let definitions = parse_token_file(&file.name, &content)?;
    Ok(SourceFile::new(file.name.clone(), definitions))
}

/// Discovers and reads every source of a layer.
///
/// `sources` pairs each configured label with its resolved filesystem path.
pub fn load_layer(
    name: &str,
    kind: LayerKind,
    sources: &[(String, PathBuf)],
) -> Result<Layer> {
    let mut files = Vec::new();
    for (label, path) in sources {
        files.extend(discover(path, label)?);
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files.dedup_by(|a, b| a.name == b.name);

    tracing::debug!(layer = name, files = files.len(), "reading token sources");
    let layer = Layer::new(name, kind, read_sources(&files)?);
    tracing::debug!(layer = name, definitions = layer.definition_count(), "loaded layer");
    Ok(layer)
}
