//! In-memory stencil provider.

use super::{StencilError, StencilProvider, StencilResult, StencilSet};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory stencils for testing and embedding hosts.
#[derive(Default)]
pub struct MemoryStencils {
    sets: RwLock<HashMap<String, StencilSet>>,
}

impl MemoryStencils {
    /// Create a new empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the stencils of a diagram type.
    pub fn insert(&self, diagram_type: &str, set: StencilSet) -> StencilResult<()> {
        let mut sets = self
            .sets
            .write()
            .map_err(|e| StencilError::Io(format!("Lock error: {}", e)))?;
        sets.insert(diagram_type.to_string(), set);
        Ok(())
    }
}

impl StencilProvider for MemoryStencils {
    fn load(&self, diagram_type: &str) -> StencilResult<StencilSet> {
        let sets = self
            .sets
            .read()
            .map_err(|e| StencilError::Io(format!("Lock error: {}", e)))?;
        sets.get(diagram_type)
            .cloned()
            .ok_or_else(|| StencilError::NotFound(diagram_type.to_string()))
    }

    fn list(&self) -> StencilResult<Vec<String>> {
        let sets = self
            .sets
            .read()
            .map_err(|e| StencilError::Io(format!("Lock error: {}", e)))?;
        let mut types: Vec<String> = sets.keys().cloned().collect();
        types.sort();
        Ok(types)
    }
}
