//! Shared domain models.
//!
//! Fuel types and attendants live in exactly one place, the station's
//! [`FuelCatalog`] and [`Roster`]. Pumps refer to them by id, so a sale made
//! through any pump is visible through every other view of the station.

mod attendant;
mod fuel;
mod pump;

pub use attendant::{Attendant, AttendantId, Roster};
pub use fuel::{FuelCatalog, FuelType, FuelTypeId, InsufficientFuel};
pub(crate) use fuel::check_name;
pub use pump::{sale_price, Pump};
