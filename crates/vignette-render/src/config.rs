//! View configuration.

use serde::{Deserialize, Serialize};
use vignette_core::routing::LABEL_PADDING;

/// Settings of a [`DiagramView`](crate::DiagramView).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    /// Draw everything inside a non-selectable layer vertex for the diagram root.
    pub include_root: bool,
    /// Margin kept around the target of a zoom, in screen units.
    pub zoom_padding: f64,
    /// Padding added to the measured width of connector end labels.
    pub label_padding: f64,
    pub disable_user_selection: bool,
    /// Font size of connector end labels.
    pub default_font_size: f64,
    /// Force tooltips on or off; `None` lets the diagram domain decide.
    pub tooltips: Option<bool>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            include_root: false,
            zoom_padding: 20.0,
            label_padding: LABEL_PADDING,
            disable_user_selection: false,
            default_font_size: 12.0,
            tooltips: None,
        }
    }
}

impl ViewConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
