use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model {name} not found (searched: {searched})")]
    NotFound { name: String, searched: String },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Resolve a model file by name from local directories.
///
/// Resolution order:
/// 1. Explicit model directory (command line / settings)
/// 2. User cache directory (platform-specific)
pub fn resolve(name: &str, model_dir: Option<&Path>) -> Result<PathBuf, ModelResolveError> {
    let mut searched = Vec::new();

    if let Some(dir) = model_dir {
        let candidate = dir.join(name);
        if candidate.exists() {
            return Ok(candidate);
        }
        searched.push(dir.display().to_string());
    }

    match model_cache_dir() {
        Ok(cache_dir) => {
            let cached = cache_dir.join(name);
            if cached.exists() {
                return Ok(cached);
            }
            searched.push(cache_dir.display().to_string());
        }
        Err(e) if searched.is_empty() => return Err(e),
        Err(_) => {}
    }

    Err(ModelResolveError::NotFound {
        name: name.to_string(),
        searched: searched.join(", "),
    })
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FarmGuard/models/`
/// - Linux: `$XDG_CACHE_HOME/FarmGuard/models/` or `~/.cache/FarmGuard/models/`
/// - Windows: `%LOCALAPPDATA%/FarmGuard/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("FarmGuard").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("FarmGuard").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}
