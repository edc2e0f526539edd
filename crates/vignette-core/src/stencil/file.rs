//! Directory-backed stencil provider.

use super::{StencilError, StencilProvider, StencilResult, StencilSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Reads `<dir>/<diagram-type>.json` stencil documents.
pub struct DirectoryStencils {
    base_path: PathBuf,
}

impl DirectoryStencils {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the file path for a diagram type.
    fn stencil_path(&self, diagram_type: &str) -> PathBuf {
        let safe: String = diagram_type
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write the stencils of a diagram type, creating the directory if needed.
    pub fn save(&self, diagram_type: &str, set: &StencilSet) -> StencilResult<()> {
        fs::create_dir_all(&self.base_path).map_err(|e| {
            StencilError::Io(format!("Failed to create {}: {}", self.base_path.display(), e))
        })?;
        let path = self.stencil_path(diagram_type);
        let json = set
            .to_json()
            .map_err(|e| StencilError::Parse(e.to_string()))?;
        fs::write(&path, json)
            .map_err(|e| StencilError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }
}

impl StencilProvider for DirectoryStencils {
    fn load(&self, diagram_type: &str) -> StencilResult<StencilSet> {
        let path = self.stencil_path(diagram_type);
        if !path.exists() {
            return Err(StencilError::NotFound(diagram_type.to_string()));
        }
        let json = fs::read_to_string(&path)
            .map_err(|e| StencilError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        StencilSet::from_json(&json)
            .map_err(|e| StencilError::Parse(format!("Failed to parse {}: {}", path.display(), e)))
    }

    fn list(&self) -> StencilResult<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| StencilError::Io(format!("Failed to read directory: {}", e)))?;

        let mut types = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    types.push(stem.to_string());
                }
            }
        }
        types.sort();
        Ok(types)
    }
}
