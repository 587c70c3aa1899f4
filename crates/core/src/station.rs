//! The station aggregate: pumps, fuel catalog and attendant roster.

use tracing::{debug, info, warn};

use crate::{
    error::{Result, StationError},
    models::{check_name, Attendant, FuelCatalog, FuelType, FuelTypeId, Pump, Roster},
    selector::AttendantSelector,
};

/// How much a customer asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SaleRequest {
    /// A volume of fuel.
    ByVolume(f64),
    /// An amount of money; converted to volume at the fuel's unit price.
    ByPrice(u64),
}

/// Receipt for a completed sale.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    /// Pump number the sale was made at.
    pub pump: usize,
    /// Fuel type name.
    pub fuel: String,
    /// Attendant credited with the sale.
    pub attendant: String,
    /// Volume the customer asked for (derived from the price for price sales).
    pub requested_volume: f64,
    /// Volume actually delivered; smaller than requested when stock ran out.
    pub delivered_volume: f64,
    /// Money charged and credited to the attendant.
    pub price: u64,
}

impl Sale {
    /// `true` when stock ran out before the request was met.
    pub fn is_partial(&self) -> bool {
        self.delivered_volume < self.requested_volume
    }
}

/// Aggregate root owning every pump, fuel type and attendant.
///
/// Fuel types and attendants are stored once; pumps refer to them by id. The
/// number of pumps is fixed once the station is built.
#[derive(Debug, Clone)]
pub struct Station {
    pumps: Vec<Pump>,
    fuel_types: FuelCatalog,
    attendants: Roster,
}

impl Station {
    /// Build a fresh station, asking `selector` which attendant staffs each pump.
    pub fn new<S>(
        pump_count: usize,
        fuel_types: impl IntoIterator<Item = FuelType>,
        attendant_names: impl IntoIterator<Item = impl AsRef<str>>,
        selector: &mut S,
    ) -> Result<Self>
    where
        S: AttendantSelector + ?Sized,
    {
        if pump_count == 0 {
            return Err(StationError::InvalidSetup(
                "a station needs at least one pump".to_string(),
            ));
        }

        let mut catalog = FuelCatalog::default();
        for fuel in fuel_types {
            fuel.check().map_err(StationError::InvalidSetup)?;
            if catalog.id_of(fuel.name()).is_some() {
                return Err(StationError::InvalidSetup(format!(
                    "fuel type {} is listed twice",
                    fuel.name()
                )));
            }
            catalog.insert(fuel);
        }
        if catalog.is_empty() {
            return Err(StationError::InvalidSetup(
                "a station needs at least one fuel type".to_string(),
            ));
        }

        let mut roster = Roster::default();
        let mut candidates = Vec::new();
        for name in attendant_names {
            let name = name.as_ref();
            check_name(name, "attendant").map_err(StationError::InvalidSetup)?;
            if roster.id_of(name).is_none() {
                candidates.push(roster.get_or_insert(name));
            }
        }
        if candidates.is_empty() {
            return Err(StationError::InvalidSetup(
                "a station needs at least one attendant".to_string(),
            ));
        }

        let pumps = (0..pump_count)
            .map(|_| {
                let pick = selector.select(candidates.len()) % candidates.len();
                Pump::new(candidates[pick], catalog.len())
            })
            .collect();

        info!(
            pumps = pump_count,
            fuel_types = catalog.len(),
            attendants = roster.len(),
            "Station created"
        );
        Ok(Self::from_parts(pumps, catalog, roster))
    }

    /// Assemble a station from already linked parts.
    ///
    /// Every id held by `pumps` must come from `fuel_types` / `attendants`.
    pub(crate) fn from_parts(pumps: Vec<Pump>, fuel_types: FuelCatalog, attendants: Roster) -> Self {
        Self {
            pumps,
            fuel_types,
            attendants,
        }
    }

    /// Number of pumps.
    pub fn pump_count(&self) -> usize {
        self.pumps.len()
    }

    /// Pump number `index`, if it exists.
    pub fn pump(&self, index: usize) -> Option<&Pump> {
        self.pumps.get(index)
    }

    /// Pumps in pump-number order.
    pub fn pumps(&self) -> &[Pump] {
        &self.pumps
    }

    /// Fuel type called `name`.
    pub fn fuel_type(&self, name: &str) -> Option<&FuelType> {
        self.fuel_types.by_name(name)
    }

    /// The shared fuel catalog.
    pub fn fuel_types(&self) -> &FuelCatalog {
        &self.fuel_types
    }

    /// Attendant called `name`.
    pub fn attendant(&self, name: &str) -> Option<&Attendant> {
        self.attendants.by_name(name)
    }

    /// The shared attendant roster.
    pub fn attendants(&self) -> &Roster {
        &self.attendants
    }

    /// Attendant staffing pump `index`.
    pub fn assigned_attendant(&self, index: usize) -> Option<&Attendant> {
        self.pumps
            .get(index)
            .and_then(|pump| self.attendants.get(pump.attendant()))
    }

    /// Volume of `fuel` sold so far through pump `index`.
    pub fn dispensed(&self, index: usize, fuel: &str) -> Option<f64> {
        let fuel = self.fuel_types.id_of(fuel)?;
        self.pumps.get(index).map(|pump| pump.dispensed(fuel))
    }

    /// Volume of `fuel` sold through all pumps together.
    pub fn total_dispensed(&self, fuel: &str) -> Option<f64> {
        let fuel = self.fuel_types.id_of(fuel)?;
        Some(self.pumps.iter().map(|pump| pump.dispensed(fuel)).sum())
    }

    /// Money collected by all attendants together.
    pub fn total_earnings(&self) -> u64 {
        self.attendants.iter().map(Attendant::earnings).sum()
    }

    /// Sell `volume` of `fuel` at pump `pump` and return the price charged.
    ///
    /// A request larger than the stock is never refused: whatever is left is
    /// delivered and charged, possibly nothing at all.
    pub fn sell_by_volume(&mut self, fuel: &str, volume: f64, pump: usize) -> Result<u64> {
        self.sell(fuel, SaleRequest::ByVolume(volume), pump)
            .map(|sale| sale.price)
    }

    /// Sell `price` worth of `fuel` at pump `pump` and return the price charged.
    ///
    /// The charge can be lower than `price` when stock runs out, and can differ
    /// from it by a rounding unit because the volume is priced again.
    pub fn sell_by_price(&mut self, fuel: &str, price: u64, pump: usize) -> Result<u64> {
        self.sell(fuel, SaleRequest::ByPrice(price), pump)
            .map(|sale| sale.price)
    }

    /// Run a sale and return the full receipt.
    pub fn sell(&mut self, fuel: &str, request: SaleRequest, pump: usize) -> Result<Sale> {
        let count = self.pumps.len();
        if pump >= count {
            return Err(StationError::PumpOutOfRange { index: pump, count });
        }
        let fuel_id = self
            .fuel_types
            .id_of(fuel)
            .ok_or_else(|| StationError::UnknownFuelType(fuel.to_string()))?;
        let requested = self.requested_volume(fuel_id, request)?;

        let delivered = self.draw_fuel(fuel_id, requested);

        let Self {
            pumps,
            fuel_types,
            attendants,
        } = self;
        let pump_ref = &mut pumps[pump];
        let price = pump_ref.record_sale(fuel_types, attendants, fuel_id, delivered);
        let attendant = attendants
            .get(pump_ref.attendant())
            .map(|a| a.name().to_string())
            .unwrap_or_default();

        debug!(pump, fuel, delivered, price, attendant = %attendant, "Sale recorded");
        Ok(Sale {
            pump,
            fuel: fuel.to_string(),
            attendant,
            requested_volume: requested,
            delivered_volume: delivered,
            price,
        })
    }

    fn requested_volume(&self, fuel: FuelTypeId, request: SaleRequest) -> Result<f64> {
        match request {
            SaleRequest::ByVolume(volume) => {
                if !volume.is_finite() || volume <= 0.0 {
                    return Err(StationError::InvalidAmount(format!(
                        "volume must be positive, got {volume}"
                    )));
                }
                Ok(volume)
            }
            SaleRequest::ByPrice(price) => {
                if price == 0 {
                    return Err(StationError::InvalidAmount(
                        "price must be positive".to_string(),
                    ));
                }
                let unit_price = self
                    .fuel_types
                    .get(fuel)
                    .map(FuelType::unit_price)
                    .unwrap_or(1);
                Ok(price as f64 / unit_price as f64)
            }
        }
    }

    /// Take up to `requested` out of the tank and return what was delivered.
    fn draw_fuel(&mut self, fuel: FuelTypeId, requested: f64) -> f64 {
        let Some(tank) = self.fuel_types.get_mut(fuel) else {
            unreachable!("fuel id {} is not part of the station catalog", fuel.index());
        };
        match tank.dispense(requested) {
            Ok(()) => requested,
            Err(short) => {
                warn!("{short}; delivering what is left");
                let capped = short.available;
                if let Err(err) = tank.dispense(capped) {
                    unreachable!("dispensing the reported stock failed: {err}");
                }
                capped
            }
        }
    }
}
