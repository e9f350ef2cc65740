//! Input discovery and output naming

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};
use thiserror::Error;

/// Extension of files picked when no input is named
pub const INPUT_EXTENSION: &str = "gcode";
/// Extension of generated scripts
pub const OUTPUT_EXTENSION: &str = "m";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("can't list directory '{}': {source}", .dir.display())]
    Io { dir: PathBuf, source: io::Error },
    #[error("no .gcode file found in '{}'", .dir.display())]
    NoCandidates { dir: PathBuf },
}

/// Most recently modified G-code file in `dir`
///
/// Files with equal modification time are ordered by name.
pub fn latest_input(dir: &Path) -> Result<PathBuf, DiscoveryError> {
    let io_err = |source| DiscoveryError::Io {
        dir: dir.to_owned(),
        source,
    };

    let mut best: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() || !has_input_extension(&path) {
            continue;
        }
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(io_err)?;
        let candidate = (modified, path);
        if best.as_ref().map_or(true, |b| candidate > *b) {
            best = Some(candidate);
        }
    }

    best.map(|(_, path)| path)
        .ok_or_else(|| DiscoveryError::NoCandidates {
            dir: dir.to_owned(),
        })
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(INPUT_EXTENSION))
}

/// Script path for `input`: same stem, `.m` extension
pub fn output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let out = input.with_extension(OUTPUT_EXTENSION);
    match (output_dir, out.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => out,
    }
}
