//! Fuel types and the station-wide catalog that owns them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a fuel type inside a [`FuelCatalog`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FuelTypeId(pub(crate) usize);

impl FuelTypeId {
    /// Position of the fuel type in catalog order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A priced product with finite inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelType {
    name: String,
    unit_price: u64,
    available: f64,
}

/// Returned by [`FuelType::dispense`] when the request exceeds the stock.
///
/// Carries the quantity that *is* available so the caller can retry with it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("not enough {fuel}: requested {requested} but only {available} available")]
pub struct InsufficientFuel {
    /// Fuel type name.
    pub fuel: String,
    /// Stock at the time of the request.
    pub available: f64,
    /// Volume that was asked for.
    pub requested: f64,
}

impl FuelType {
    /// Build a fuel type. Values are checked when the station is assembled.
    pub fn new(name: impl Into<String>, unit_price: u64, available: f64) -> Self {
        Self {
            name: name.into(),
            unit_price,
            available,
        }
    }

    /// Unique catalog key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Currency units per volume unit.
    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    /// Remaining stock.
    pub fn available(&self) -> f64 {
        self.available
    }

    /// Take `requested` out of the stock.
    ///
    /// Fails without touching the stock when `requested` is larger than what
    /// is left. Dispensing exactly the available amount empties the tank.
    pub fn dispense(&mut self, requested: f64) -> Result<(), InsufficientFuel> {
        if requested > self.available {
            return Err(InsufficientFuel {
                fuel: self.name.clone(),
                available: self.available,
                requested,
            });
        }
        self.available = (self.available - requested).max(0.0);
        Ok(())
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        check_name(&self.name, "fuel type")?;
        if self.unit_price == 0 {
            return Err(format!("fuel type {} must have a positive price", self.name));
        }
        if !self.available.is_finite() || self.available < 0.0 {
            return Err(format!(
                "fuel type {} has invalid stock {}",
                self.name, self.available
            ));
        }
        Ok(())
    }
}

/// Names end up as colon-delimited fields in the state file.
pub(crate) fn check_name(name: &str, what: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{what} name must not be empty"));
    }
    if name.contains([':', '\n', '\r']) {
        return Err(format!("{what} name {name:?} contains a reserved character"));
    }
    Ok(())
}

/// Owns every [`FuelType`] of a station, keyed by name, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct FuelCatalog {
    entries: Vec<FuelType>,
    index: HashMap<String, FuelTypeId>,
}

impl FuelCatalog {
    /// Insert a fuel type, replacing any earlier definition with the same name.
    pub fn insert(&mut self, fuel: FuelType) -> FuelTypeId {
        if let Some(&id) = self.index.get(fuel.name()) {
            self.entries[id.0] = fuel;
            return id;
        }
        let id = FuelTypeId(self.entries.len());
        self.index.insert(fuel.name().to_string(), id);
        self.entries.push(fuel);
        id
    }

    /// Resolve a name to its id.
    pub fn id_of(&self, name: &str) -> Option<FuelTypeId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, id: FuelTypeId) -> Option<&FuelType> {
        self.entries.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: FuelTypeId) -> Option<&mut FuelType> {
        self.entries.get_mut(id.0)
    }

    pub fn by_name(&self, name: &str) -> Option<&FuelType> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    /// Fuel types in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &FuelType> {
        self.entries.iter()
    }

    /// Fuel types paired with their ids, in catalog order.
    pub fn iter_ids(&self) -> impl Iterator<Item = (FuelTypeId, &FuelType)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, fuel)| (FuelTypeId(idx), fuel))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispense_reduces_stock() {
        let mut fuel = FuelType::new("corriente", 14500, 100.0);
        fuel.dispense(40.0).expect("enough stock");
        assert_eq!(fuel.available(), 60.0);
    }

    #[test]
    fn dispense_can_empty_the_tank() {
        let mut fuel = FuelType::new("corriente", 14500, 100.0);
        fuel.dispense(100.0).expect("exact stock");
        assert_eq!(fuel.available(), 0.0);
    }

    #[test]
    fn failed_dispense_reports_stock_and_keeps_it() {
        let mut fuel = FuelType::new("extra", 21090, 50.0);
        let err = fuel.dispense(50.5).unwrap_err();
        assert_eq!(err.available, 50.0);
        assert_eq!(err.requested, 50.5);
        assert_eq!(err.fuel, "extra");
        assert_eq!(fuel.available(), 50.0);
    }

    #[test]
    fn check_rejects_bad_definitions() {
        assert!(FuelType::new("plus", 0, 10.0).check().is_err());
        assert!(FuelType::new("plus", 10, -1.0).check().is_err());
        assert!(FuelType::new("plus", 10, f64::NAN).check().is_err());
        assert!(FuelType::new("a:b", 10, 1.0).check().is_err());
        assert!(FuelType::new("  ", 10, 1.0).check().is_err());
        assert!(FuelType::new("plus", 10, 0.0).check().is_ok());
    }

    #[test]
    fn catalog_keeps_insertion_order_and_replaces_duplicates() {
        let mut catalog = FuelCatalog::default();
        let corriente = catalog.insert(FuelType::new("corriente", 14500, 100.0));
        let extra = catalog.insert(FuelType::new("extra", 21090, 50.0));
        let again = catalog.insert(FuelType::new("corriente", 15000, 10.0));

        assert_eq!(corriente, again);
        assert_ne!(corriente, extra);
        assert_eq!(catalog.len(), 2);
        let names: Vec<_> = catalog.iter().map(FuelType::name).collect();
        assert_eq!(names, ["corriente", "extra"]);
        assert_eq!(catalog.by_name("corriente").map(FuelType::unit_price), Some(15000));
        assert!(catalog.by_name("diesel").is_none());
    }
}
