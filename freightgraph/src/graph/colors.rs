//! Per-warehouse color hints for multi-origin edges.

use crate::model::Warehouse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Palette cycled through in warehouse name order.
pub const DEFAULT_PALETTE: &[&str] = &[
    "#4f46e5", "#0891b2", "#059669", "#d97706", "#dc2626", "#7c3aed", "#db2777", "#65a30d",
];

/// Warehouse name to color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseColors {
    colors: BTreeMap<String, String>,
}

impl WarehouseColors {
    /// Assigns palette colors by sorted warehouse name, then applies overrides.
    #[must_use]
    pub fn assign(warehouses: &[Warehouse], overrides: &BTreeMap<String, String>) -> Self {
        let mut names: Vec<&str> = warehouses.iter().map(|w| w.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();

        let mut colors: BTreeMap<String, String> = names
            .into_iter()
            .zip(DEFAULT_PALETTE.iter().cycle())
            .map(|(name, color)| (name.to_string(), (*color).to_string()))
            .collect();
        for (name, color) in overrides {
            if let Some(slot) = colors.get_mut(name) {
                slot.clone_from(color);
            }
        }
        Self { colors }
    }

    /// Returns the color for a warehouse.
    #[must_use]
    pub fn get(&self, warehouse: &str) -> Option<&str> {
        self.colors.get(warehouse).map(String::as_str)
    }

    /// Returns the number of colored warehouses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Returns true if no warehouse is colored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
