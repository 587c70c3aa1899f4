#![warn(clippy::all, missing_docs)]

//! Core domain logic for the gasolinera station manager.
//!
//! This crate hosts the station model (fuel inventory, pumps, attendants),
//! the sale operations, the text state format and its on-disk store, and the
//! configuration used by the terminal console.

pub mod codec;
pub mod config;
pub mod error;
#[allow(missing_docs)]
pub mod models;
pub mod save;
pub mod selector;
pub mod station;

pub use config::{AppConfig, StationTemplate};
pub use error::{Result, StationError};
pub use models::{Attendant, FuelType, InsufficientFuel, Pump};
pub use save::{StateEntry, StateStore};
pub use selector::{AttendantSelector, RandomSelector, RoundRobinSelector};
pub use station::{Sale, SaleRequest, Station};
