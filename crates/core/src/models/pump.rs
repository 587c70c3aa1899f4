//! Dispensing points.

use super::{AttendantId, FuelCatalog, FuelTypeId, Roster};

/// A pump staffed by one attendant.
///
/// All pumps draw from the station's shared [`FuelCatalog`]; a pump only keeps
/// its own running total of the volume it has delivered per fuel type.
#[derive(Debug, Clone, PartialEq)]
pub struct Pump {
    attendant: AttendantId,
    dispensed: Vec<f64>,
}

impl Pump {
    /// Pump with a zero counter for each of the `fuel_count` catalog entries.
    pub(crate) fn new(attendant: AttendantId, fuel_count: usize) -> Self {
        Self {
            attendant,
            dispensed: vec![0.0; fuel_count],
        }
    }

    /// Attendant assigned at construction.
    pub fn attendant(&self) -> AttendantId {
        self.attendant
    }

    /// Cumulative volume of `fuel` sold through this pump.
    pub fn dispensed(&self, fuel: FuelTypeId) -> f64 {
        self.dispensed.get(fuel.0).copied().unwrap_or(0.0)
    }

    pub(crate) fn set_dispensed(&mut self, fuel: FuelTypeId, volume: f64) {
        if fuel.0 >= self.dispensed.len() {
            self.dispensed.resize(fuel.0 + 1, 0.0);
        }
        self.dispensed[fuel.0] = volume;
    }

    /// Price `delivered` of `fuel`, credit the attendant and bump the counter.
    ///
    /// The fuel must already have been taken out of the catalog; this only
    /// does the bookkeeping on the pump side.
    pub(crate) fn record_sale(
        &mut self,
        catalog: &FuelCatalog,
        roster: &mut Roster,
        fuel: FuelTypeId,
        delivered: f64,
    ) -> u64 {
        let Some(fuel_type) = catalog.get(fuel) else {
            unreachable!("fuel id {} is not part of the station catalog", fuel.0);
        };
        let price = sale_price(fuel_type.unit_price(), delivered);

        let Some(attendant) = roster.get_mut(self.attendant) else {
            unreachable!("attendant id {} is not on the station roster", self.attendant.0);
        };
        attendant.credit(price);

        let sold = self.dispensed(fuel) + delivered;
        self.set_dispensed(fuel, sold);
        price
    }
}

/// `unit_price * volume`, rounded to the nearest currency unit.
pub fn sale_price(unit_price: u64, volume: f64) -> u64 {
    (unit_price as f64 * volume).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FuelType;

    fn fixture() -> (FuelCatalog, Roster, FuelTypeId, FuelTypeId, AttendantId) {
        let mut catalog = FuelCatalog::default();
        let corriente = catalog.insert(FuelType::new("corriente", 14500, 100.0));
        let plus = catalog.insert(FuelType::new("plus", 16251, 80.0));
        let mut roster = Roster::default();
        let bob = roster.get_or_insert("Bob");
        (catalog, roster, corriente, plus, bob)
    }

    #[test]
    fn sale_price_rounds_to_nearest() {
        assert_eq!(sale_price(14500, 100.0), 1_450_000);
        assert_eq!(sale_price(16251, 0.5), 8126);
        assert_eq!(sale_price(3, 0.1), 0);
        assert_eq!(sale_price(3, 0.2), 1);
        assert_eq!(sale_price(10, 0.0), 0);
    }

    #[test]
    fn record_sale_credits_attendant_and_counts_volume() {
        let (catalog, mut roster, corriente, plus, bob) = fixture();
        let mut pump = Pump::new(bob, catalog.len());

        let price = pump.record_sale(&catalog, &mut roster, corriente, 2.0);
        assert_eq!(price, 29_000);
        let price = pump.record_sale(&catalog, &mut roster, corriente, 1.5);
        assert_eq!(price, 21_750);

        assert_eq!(pump.dispensed(corriente), 3.5);
        assert_eq!(pump.dispensed(plus), 0.0);
        assert_eq!(roster.get(bob).map(|a| a.earnings()), Some(50_750));
        // Inventory is not the pump's business.
        assert_eq!(catalog.get(corriente).map(FuelType::available), Some(100.0));
    }

    #[test]
    fn set_dispensed_overwrites_counter() {
        let (catalog, _, corriente, _, bob) = fixture();
        let mut pump = Pump::new(bob, catalog.len());
        pump.set_dispensed(corriente, 4.0);
        pump.set_dispensed(corriente, 2.2);
        assert_eq!(pump.dispensed(corriente), 2.2);
        assert_eq!(pump.attendant(), bob);
    }
}
