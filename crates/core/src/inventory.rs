//! Reagent and consumable inventory.
//!
//! Stock status is derived from the item on demand rather than stored, so it can never
//! disagree with the stock level or the calendar.

use crate::constants::{EXPIRY_WARNING_DAYS, INVENTORY_ID_PREFIX, SEQUENTIAL_ID_WIDTH};
use crate::{LabError, LabResult};
use chrono::{DateTime, NaiveDate, Utc};
use lims_ids::SequentialIdGenerator;
use lims_types::{NonEmptyText, Price};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryCategory {
    Reagent,
    Consumable,
    Equipment,
    Calibrator,
    Control,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
    Expired,
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StockStatus::InStock => "in stock",
            StockStatus::LowStock => "low stock",
            StockStatus::OutOfStock => "out of stock",
            StockStatus::Expired => "expired",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: NonEmptyText,
    pub category: InventoryCategory,
    pub sku: String,
    pub current_stock: u32,
    pub minimum_stock: u32,
    pub unit: String,
    pub cost_per_unit: Price,
    pub supplier: String,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub location: String,
    pub last_updated: DateTime<Utc>,
}

impl InventoryItem {
    /// Expiry takes precedence over stock level.
    pub fn status(&self, today: NaiveDate) -> StockStatus {
        if self.expiry_date.is_some_and(|expiry| expiry < today) {
            StockStatus::Expired
        } else if self.current_stock == 0 {
            StockStatus::OutOfStock
        } else if self.current_stock < self.minimum_stock {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    /// Whole days until expiry; negative once expired, `None` without an expiry date.
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry_date
            .map(|expiry| expiry.signed_duration_since(today).num_days())
    }

    pub fn expiry_label(&self, today: NaiveDate) -> Option<String> {
        self.days_until_expiry(today).map(|days| match days {
            d if d < 0 => format!("Expired {} days ago", -d),
            0 => "Expires today".to_owned(),
            d => format!("{d} days remaining"),
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewInventoryItem {
    pub name: NonEmptyText,
    pub category: InventoryCategory,
    pub sku: String,
    pub current_stock: u32,
    pub minimum_stock: u32,
    pub unit: String,
    pub cost_per_unit: Price,
    pub supplier: String,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub batch_number: Option<String>,
    pub location: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub total: usize,
    pub low_stock: usize,
    pub expired: usize,
    pub expiring_this_week: usize,
}

#[derive(Clone, Debug)]
pub struct InventoryStore {
    items: Vec<InventoryItem>,
    ids: SequentialIdGenerator,
}

impl Default for InventoryStore {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            ids: SequentialIdGenerator::new(INVENTORY_ID_PREFIX, SEQUENTIAL_ID_WIDTH),
        }
    }
}

impl InventoryStore {
    pub fn list(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn add(&mut self, new: NewInventoryItem) -> InventoryItem {
        let item = InventoryItem {
            id: self.ids.next_id(),
            name: new.name,
            category: new.category,
            sku: new.sku,
            current_stock: new.current_stock,
            minimum_stock: new.minimum_stock,
            unit: new.unit,
            cost_per_unit: new.cost_per_unit,
            supplier: new.supplier,
            expiry_date: new.expiry_date,
            batch_number: new.batch_number,
            location: new.location,
            last_updated: Utc::now(),
        };
        tracing::info!(item_id = %item.id, sku = %item.sku, "inventory item added");
        self.items.push(item.clone());
        item
    }

    /// Add `delta` units (negative to consume). Stock never drops below zero.
    pub fn adjust_stock(&mut self, id: &str, delta: i64) -> LabResult<InventoryItem> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| LabError::InventoryItemNotFound(id.to_owned()))?;

        let adjusted = (i64::from(item.current_stock) + delta).clamp(0, i64::from(u32::MAX));
        let before = item.current_stock;
        item.current_stock = u32::try_from(adjusted).unwrap_or(u32::MAX);
        item.last_updated = Utc::now();

        tracing::info!(item_id = id, before, after = item.current_stock, "stock adjusted");
        Ok(item.clone())
    }

    pub fn stats(&self, today: NaiveDate) -> InventoryStats {
        self.items
            .iter()
            .fold(InventoryStats::default(), |mut stats, item| {
                stats.total += 1;
                match item.status(today) {
                    StockStatus::LowStock => stats.low_stock += 1,
                    StockStatus::Expired => stats.expired += 1,
                    _ => {}
                }
                if item
                    .days_until_expiry(today)
                    .is_some_and(|days| (0..=EXPIRY_WARNING_DAYS).contains(&days))
                {
                    stats.expiring_this_week += 1;
                }
                stats
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reagent(stock: u32, minimum: u32, expiry: Option<NaiveDate>) -> NewInventoryItem {
        NewInventoryItem {
            name: NonEmptyText::new("CBC Reagent Kit").unwrap(),
            category: InventoryCategory::Reagent,
            sku: "REG-CBC-001".into(),
            current_stock: stock,
            minimum_stock: minimum,
            unit: "kit".into(),
            cost_per_unit: Price::new(45.5).unwrap(),
            supplier: "MedSupply Corp".into(),
            expiry_date: expiry,
            batch_number: Some("BCH240115".into()),
            location: "Reagent Fridge A1".into(),
        }
    }

    #[test]
    fn status_is_derived_with_expiry_first() {
        let today = date(2024, 1, 15);
        let mut store = InventoryStore::default();
        let fine = store.add(reagent(25, 10, Some(date(2024, 6, 15))));
        let low = store.add(reagent(5, 20, None));
        let empty = store.add(reagent(0, 5, None));
        let expired = store.add(reagent(0, 5, Some(date(2024, 1, 10))));

        assert_eq!(fine.status(today), StockStatus::InStock);
        assert_eq!(low.status(today), StockStatus::LowStock);
        assert_eq!(empty.status(today), StockStatus::OutOfStock);
        assert_eq!(expired.status(today), StockStatus::Expired);
        assert_eq!(expired.id, "INV004");
    }

    #[test]
    fn expiry_day_counts_and_labels() {
        let today = date(2024, 1, 15);
        let mut store = InventoryStore::default();
        let item = store.add(reagent(1, 1, Some(date(2024, 1, 20))));
        assert_eq!(item.days_until_expiry(today), Some(5));
        assert_eq!(item.expiry_label(today).as_deref(), Some("5 days remaining"));
        assert_eq!(item.expiry_label(date(2024, 1, 20)).as_deref(), Some("Expires today"));
        assert_eq!(
            item.expiry_label(date(2024, 1, 23)).as_deref(),
            Some("Expired 3 days ago")
        );
    }

    #[test]
    fn adjust_stock_saturates_at_zero() {
        let mut store = InventoryStore::default();
        let item = store.add(reagent(3, 1, None));
        assert_eq!(store.adjust_stock(&item.id, -10).unwrap().current_stock, 0);
        assert_eq!(store.adjust_stock(&item.id, 7).unwrap().current_stock, 7);
        assert!(matches!(
            store.adjust_stock("INV999", 1),
            Err(LabError::InventoryItemNotFound(_))
        ));
    }

    #[test]
    fn stats_count_expiring_within_a_week() {
        let today = date(2024, 1, 15);
        let mut store = InventoryStore::default();
        store.add(reagent(25, 10, Some(date(2024, 1, 15))));
        store.add(reagent(25, 10, Some(date(2024, 1, 22))));
        store.add(reagent(25, 10, Some(date(2024, 1, 23))));
        store.add(reagent(5, 20, Some(date(2024, 1, 1))));
        store.add(reagent(5, 20, None));

        assert_eq!(
            store.stats(today),
            InventoryStats {
                total: 5,
                low_stock: 1,
                expired: 1,
                expiring_this_week: 2,
            }
        );
    }
}
