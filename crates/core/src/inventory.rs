//! Inventory model: item counts that never go negative.

use crate::item::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Removal would drive a count below zero.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Not enough of an item.
    #[error("need {needed}x {item} but only {available} held")]
    Insufficient {
        /// Item requested.
        item: ItemId,
        /// Units requested.
        needed: u32,
        /// Units held.
        available: u32,
    },
}

/// Mapping from item to count.
///
/// Items with a zero count are not stored, so an inventory that only had
/// lookups performed against it compares equal to its former self.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    counts: BTreeMap<ItemId, u32>,
}

impl Inventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Units of `item` held.
    pub fn count(&self, item: &ItemId) -> u32 {
        self.counts.get(item).copied().unwrap_or(0)
    }

    /// Whether at least `amount` of `item` is held.
    pub fn has(&self, item: &ItemId, amount: u32) -> bool {
        self.count(item) >= amount
    }

    /// Add items, returning the new count.
    pub fn add(&mut self, item: &ItemId, amount: u32) -> u32 {
        if amount == 0 {
            return self.count(item);
        }
        let slot = self.counts.entry(item.clone()).or_insert(0);
        *slot = slot.saturating_add(amount);
        *slot
    }

    /// Remove exactly `amount` items or nothing at all.
    pub fn remove(&mut self, item: &ItemId, amount: u32) -> Result<u32, InventoryError> {
        let available = self.count(item);
        if available < amount {
            return Err(InventoryError::Insufficient {
                item: item.clone(),
                needed: amount,
                available,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.counts.remove(item);
        } else {
            self.counts.insert(item.clone(), remaining);
        }
        Ok(remaining)
    }

    /// Remove every `(item, amount)` pair, or nothing if any is short.
    pub fn remove_all(&mut self, items: &BTreeMap<ItemId, u32>) -> Result<(), InventoryError> {
        for (item, &amount) in items {
            let available = self.count(item);
            if available < amount {
                return Err(InventoryError::Insufficient {
                    item: item.clone(),
                    needed: amount,
                    available,
                });
            }
        }
        for (item, &amount) in items {
            self.remove(item, amount)?;
        }
        Ok(())
    }

    /// Held items in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, u32)> {
        self.counts.iter().map(|(item, count)| (item, *count))
    }

    /// Number of distinct items held.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(ItemId, u32)> for Inventory {
    fn from_iter<T: IntoIterator<Item = (ItemId, u32)>>(iter: T) -> Self {
        let mut inventory = Inventory::new();
        for (item, count) in iter {
            inventory.add(&item, count);
        }
        inventory
    }
}
