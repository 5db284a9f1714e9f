use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("model URL has no file name: {0}")]
    NoFileName(String),
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a segmentation model given as a local path or an `http(s)` URL.
///
/// Local paths must exist. URLs are downloaded once into the model cache
/// directory and reused on later runs.
pub fn resolve(source: &str, progress: Option<ProgressFn>) -> Result<PathBuf, ModelResolveError> {
    if !is_url(source) {
        let path = PathBuf::from(source);
        return if path.exists() {
            Ok(path)
        } else {
            Err(ModelResolveError::NotFound(path))
        };
    }

    let name = file_name_from_url(source)
        .ok_or_else(|| ModelResolveError::NoFileName(source.to_string()))?;
    let cache_dir = model_cache_dir()?;
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        log::debug!("Using cached model {}", cached_path.display());
        return Ok(cached_path);
    }

    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading model from {source}");
    download(source, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Backdrop/models/`
/// - Linux: `$XDG_CACHE_HOME/Backdrop/models/` or `~/.cache/Backdrop/models/`
/// - Windows: `%LOCALAPPDATA%/Backdrop/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Backdrop").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Backdrop").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Last path segment of a URL, ignoring any query string or fragment.
fn file_name_from_url(url: &str) -> Option<&str> {
    let without_query = url.split(['?', '#']).next()?;
    let scheme_end = without_query.find("://").map(|i| i + 3)?;
    let path = &without_query[scheme_end..];
    let (_, rest) = path.split_once('/')?;
    rest.rsplit('/').next().filter(|name| !name.is_empty())
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_err = |e: reqwest::Error| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    };

    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;
    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(download_err)?;

    // Write next to the destination, then rename so a half-written model is never picked up
    let temp_path = dest.with_extension("part");
    let write_err = |e: std::io::Error| ModelResolveError::Write {
        path: temp_path.clone(),
        source: e,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;

    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        file.write_all(chunk).map_err(write_err)?;
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}
