//! Typed attributes pulled out of free-form tags.

use serde::{Deserialize, Serialize};

use blastmap_core::constants::{DEFAULT_BUILDING_HEIGHT, METERS_PER_LEVEL};

use crate::osm::Tags;

/// Optional attributes of a classified feature. Absent or unparsable tags
/// are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttributes {
    pub name: Option<String>,
    /// `height` in meters.
    pub height: Option<f64>,
    /// `building:levels`.
    pub levels: Option<f64>,
    /// `ele` in meters above sea level.
    pub elevation: Option<f64>,
    /// `min_height` in meters.
    pub min_height: Option<f64>,
    pub operator: Option<String>,
}

impl FeatureAttributes {
    pub fn from_tags(tags: &Tags) -> Self {
        Self {
            name: tags.get("name").cloned(),
            height: tags.get("height").and_then(|v| parse_positive(v)),
            levels: tags.get("building:levels").and_then(|v| parse_positive(v)),
            elevation: tags.get("ele").and_then(|v| parse_number(v)),
            min_height: tags.get("min_height").and_then(|v| parse_positive(v)),
            operator: tags.get("operator").cloned(),
        }
    }

    /// Extrusion height: `height`, else `levels × 3`, else 10 m.
    pub fn building_height(&self) -> f64 {
        self.height
            .or_else(|| self.levels.map(|l| l * METERS_PER_LEVEL))
            .unwrap_or(DEFAULT_BUILDING_HEIGHT)
    }
}

/// Leading decimal number of a tag value: `"12"`, `"12.5 m"`, `"7,5"`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let end = raw
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || c == ',' || (i == 0 && c == '-')))
        .map_or(raw.len(), |(i, _)| i);
    raw[..end].replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_positive(raw: &str) -> Option<f64> {
    parse_number(raw).filter(|v| *v > 0.0)
}
