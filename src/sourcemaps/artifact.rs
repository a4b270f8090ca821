use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::transform::PLACEHOLDER_HOST;

const SCRIPT_EXTENSION: &str = ".js";
const MAP_SUFFIX: &str = ".map";

/// A built script and its source map, plus what happened to them during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub js_file: PathBuf,
    pub map_file: PathBuf,
    /// URL the collector associates the map with.
    pub server_url: String,
    pub map_cleaned: bool,
    pub source_cleaned: bool,
    pub error: Option<String>,
}

impl BuildArtifact {
    pub fn new(dir: &Path, file_name: &str) -> Self {
        Self {
            js_file: dir.join(file_name),
            map_file: dir.join(format!("{}{}", file_name, MAP_SUFFIX)),
            server_url: public_url(file_name),
            map_cleaned: false,
            source_cleaned: false,
            error: None,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.error.is_none()
    }
}

pub fn public_url(file_name: &str) -> String {
    format!("https://{}/{}", PLACEHOLDER_HOST, file_name)
}

/// Lists every `*.js` file in `dir` that has a sibling `*.js.map`, by name.
pub fn discover(dir: &Path) -> io::Result<Vec<BuildArtifact>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(name) => {
                log::debug!("skipping non UTF-8 file name {:?}", name);
                continue;
            }
        };
        if !name.ends_with(SCRIPT_EXTENSION) || !entry.path().is_file() {
            continue;
        }
        if dir.join(format!("{}{}", name, MAP_SUFFIX)).is_file() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names
        .iter()
        .map(|name| BuildArtifact::new(dir, name))
        .collect())
}
