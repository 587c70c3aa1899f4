//! Line-oriented text encoding of a [`Station`].
//!
//! One record per line, colon-delimited:
//!
//! ```text
//! tipo:<name>:<unit price>:<available>
//! surtidor:<attendant>:<fuel>:<volume>:<fuel>:<volume>...
//! empleado:<name>:<earnings>
//! ```
//!
//! The encoder writes every fuel type, then every pump, then every attendant.
//! The decoder accepts the records in any order.

use std::{fmt::Write as _, str::FromStr};

use tracing::warn;

use crate::{
    error::{Result, StationError},
    models::{AttendantId, FuelCatalog, FuelType, Pump, Roster},
    station::Station,
};

const FUEL_TAG: &str = "tipo";
const PUMP_TAG: &str = "surtidor";
const ATTENDANT_TAG: &str = "empleado";
const SEPARATOR: char = ':';

/// Render the whole station state.
pub fn encode(station: &Station) -> String {
    let catalog = station.fuel_types();
    let mut out = String::new();

    for fuel in catalog.iter() {
        let _ = writeln!(
            out,
            "{FUEL_TAG}:{}:{}:{:?}",
            fuel.name(),
            fuel.unit_price(),
            fuel.available()
        );
    }

    for pump in station.pumps() {
        let attendant = station
            .attendants()
            .get(pump.attendant())
            .map(|a| a.name())
            .unwrap_or_default();
        out.push_str(PUMP_TAG);
        out.push(SEPARATOR);
        out.push_str(attendant);
        for (id, fuel) in catalog.iter_ids() {
            let _ = write!(out, ":{}:{:?}", fuel.name(), pump.dispensed(id));
        }
        out.push('\n');
    }

    for attendant in station.attendants().iter() {
        let _ = writeln!(
            out,
            "{ATTENDANT_TAG}:{}:{}",
            attendant.name(),
            attendant.earnings()
        );
    }

    out
}

struct PendingPump {
    line: usize,
    attendant: AttendantId,
    volumes: Vec<(String, f64)>,
}

/// Rebuild a station from its text form.
pub fn decode(input: &str) -> Result<Station> {
    let mut catalog = FuelCatalog::default();
    let mut roster = Roster::default();
    let mut pending = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.trim_end_matches('\r');
        if raw.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = raw.split(SEPARATOR).collect();
        match fields[0] {
            FUEL_TAG => {
                let [_, name, price, available] = fields[..] else {
                    return Err(StationError::malformed(
                        line,
                        format!("expected 4 fields, found {}", fields.len()),
                    ));
                };
                let price: u64 = parse_field(line, "unit price", price)?;
                if price == 0 {
                    return Err(StationError::malformed(line, "unit price must be positive"));
                }
                let available = parse_volume(line, available)?;
                catalog.insert(FuelType::new(name, price, available));
            }
            PUMP_TAG => {
                if fields.len() < 2 {
                    return Err(StationError::malformed(line, "pump record without attendant"));
                }
                let pairs = &fields[2..];
                if pairs.len() % 2 != 0 {
                    return Err(StationError::malformed(
                        line,
                        "fuel/volume pairs are incomplete",
                    ));
                }
                let volumes = pairs
                    .chunks_exact(2)
                    .map(|pair| Ok((pair[0].to_string(), parse_volume(line, pair[1])?)))
                    .collect::<Result<Vec<_>>>()?;
                pending.push(PendingPump {
                    line,
                    attendant: roster.get_or_insert(fields[1]),
                    volumes,
                });
            }
            ATTENDANT_TAG => {
                let [_, name, earnings] = fields[..] else {
                    return Err(StationError::malformed(
                        line,
                        format!("expected 3 fields, found {}", fields.len()),
                    ));
                };
                let earnings: u64 = parse_field(line, "earnings", earnings)?;
                let id = roster.get_or_insert(name);
                if let Some(attendant) = roster.get_mut(id) {
                    attendant.credit(earnings);
                }
            }
            other => {
                warn!(line, tag = other, "Skipping unknown record");
            }
        }
    }

    let mut pumps = Vec::with_capacity(pending.len());
    for record in pending {
        let mut pump = Pump::new(record.attendant, catalog.len());
        for (name, volume) in record.volumes {
            let fuel = catalog.id_of(&name).ok_or_else(|| {
                StationError::malformed(record.line, format!("unknown fuel type {name}"))
            })?;
            pump.set_dispensed(fuel, volume);
        }
        pumps.push(pump);
    }

    Ok(Station::from_parts(pumps, catalog, roster))
}

fn parse_field<T: FromStr>(line: usize, what: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| StationError::malformed(line, format!("invalid {what} {raw:?}")))
}

fn parse_volume(line: usize, raw: &str) -> Result<f64> {
    let volume: f64 = parse_field(line, "volume", raw)?;
    if !volume.is_finite() || volume < 0.0 {
        return Err(StationError::malformed(
            line,
            format!("volume {raw:?} out of range"),
        ));
    }
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Attendant, selector::RoundRobinSelector};

    fn busy_station() -> Station {
        let mut station = Station::new(
            4,
            [
                FuelType::new("corriente", 14500, 100.0),
                FuelType::new("plus", 16251, 80.0),
                FuelType::new("extra", 21090, 50.0),
            ],
            ["Alice", "Bob", "Charly"],
            &mut RoundRobinSelector::default(),
        )
        .expect("valid station");
        station.sell_by_volume("corriente", 2.2, 1).expect("sale");
        station.sell_by_price("plus", 30_000, 3).expect("sale");
        station.sell_by_volume("extra", 60.0, 0).expect("sale");
        station
    }

    #[test]
    fn encodes_sections_in_order() {
        let station = Station::new(
            1,
            [FuelType::new("corriente", 14500, 100.0)],
            ["Bob"],
            &mut RoundRobinSelector::default(),
        )
        .expect("valid station");
        assert_eq!(
            encode(&station),
            "tipo:corriente:14500:100.0\nsurtidor:Bob:corriente:0.0\nempleado:Bob:0\n"
        );
    }

    #[test]
    fn round_trip_preserves_state() -> Result<()> {
        let original = busy_station();
        let decoded = decode(&encode(&original))?;

        assert_eq!(decoded.pump_count(), original.pump_count());
        let fuels: Vec<_> = original.fuel_types().iter().collect();
        let decoded_fuels: Vec<_> = decoded.fuel_types().iter().collect();
        assert_eq!(fuels, decoded_fuels);

        for index in 0..original.pump_count() {
            assert_eq!(
                decoded.assigned_attendant(index).map(Attendant::name),
                original.assigned_attendant(index).map(Attendant::name)
            );
            for fuel in ["corriente", "plus", "extra"] {
                assert_eq!(decoded.dispensed(index, fuel), original.dispensed(index, fuel));
            }
        }

        let staff: Vec<_> = original.attendants().iter().collect();
        let decoded_staff: Vec<_> = decoded.attendants().iter().collect();
        assert_eq!(staff, decoded_staff);
        Ok(())
    }

    #[test]
    fn decoded_station_shares_inventory_between_pumps() -> Result<()> {
        let mut station = decode(
            "tipo:corriente:14500:10.0\n\
             surtidor:Alice:corriente:0.0\n\
             surtidor:Bob:corriente:0.0\n",
        )?;
        station.sell_by_volume("corriente", 6.0, 0)?;
        let second = station.sell_by_volume("corriente", 6.0, 1)?;

        assert_eq!(second, 14500 * 4);
        assert_eq!(station.fuel_type("corriente").map(FuelType::available), Some(0.0));
        assert_eq!(station.attendant("Bob").map(Attendant::earnings), Some(14500 * 4));
        Ok(())
    }

    #[test]
    fn decodes_minimal_record_set() -> Result<()> {
        let station = decode("tipo:corriente:14500:100.0\nsurtidor:Bob:corriente:5.0\nempleado:Bob:0\n")?;

        assert_eq!(station.fuel_types().len(), 1);
        assert_eq!(station.pump_count(), 1);
        assert_eq!(station.assigned_attendant(0).map(Attendant::name), Some("Bob"));
        assert_eq!(station.dispensed(0, "corriente"), Some(5.0));
        assert_eq!(station.attendant("Bob").map(Attendant::earnings), Some(0));
        assert_eq!(station.attendants().len(), 1);
        Ok(())
    }

    #[test]
    fn records_may_come_in_any_order() -> Result<()> {
        let station = decode(
            "empleado:Alice:500\n\
             surtidor:Bob:plus:1.5:corriente:2.0\n\
             surtidor:Alice:corriente:1.0\n\
             tipo:plus:16251:80.0\n\
             empleado:Bob:250\n\
             tipo:corriente:14500:100.0\n",
        )?;

        assert_eq!(station.pump_count(), 2);
        assert_eq!(station.dispensed(0, "plus"), Some(1.5));
        assert_eq!(station.dispensed(0, "corriente"), Some(2.0));
        assert_eq!(station.dispensed(1, "corriente"), Some(1.0));
        assert_eq!(station.dispensed(1, "plus"), Some(0.0));
        assert_eq!(station.attendant("Alice").map(Attendant::earnings), Some(500));
        assert_eq!(station.attendant("Bob").map(Attendant::earnings), Some(250));
        Ok(())
    }

    #[test]
    fn repeated_attendant_records_add_up() -> Result<()> {
        let station = decode("empleado:Alice:500\nempleado:Alice:250\n")?;
        assert_eq!(station.attendant("Alice").map(Attendant::earnings), Some(750));
        Ok(())
    }

    #[test]
    fn blank_lines_and_unknown_tags_are_skipped() -> Result<()> {
        let station = decode("\n# comment\ntipo:corriente:14500:1.0\r\n\nbomba:x\n")?;
        assert_eq!(station.fuel_types().len(), 1);
        assert_eq!(station.fuel_type("corriente").map(FuelType::available), Some(1.0));
        Ok(())
    }

    #[test]
    fn malformed_numbers_are_reported_with_line() {
        let err = decode("tipo:corriente:14500:100.0\ntipo:plus:caro:80.0\n").unwrap_err();
        assert!(matches!(err, StationError::MalformedState { line: 2, .. }));

        let err = decode("surtidor:Bob:corriente:mucho\n").unwrap_err();
        assert!(matches!(err, StationError::MalformedState { line: 1, .. }));

        let err = decode("empleado:Bob:-3\n").unwrap_err();
        assert!(matches!(err, StationError::MalformedState { line: 1, .. }));
    }

    #[test]
    fn structural_errors_are_malformed() {
        for input in [
            "tipo:corriente:14500\n",
            "tipo:corriente:0:10.0\n",
            "tipo:corriente:14500:-1.0\n",
            "surtidor\n",
            "surtidor:Bob:corriente\n",
            "empleado:Bob\n",
            "tipo:corriente:14500:1.0\nsurtidor:Bob:diesel:1.0\n",
        ] {
            let result = decode(input);
            assert!(
                matches!(result, Err(StationError::MalformedState { .. })),
                "{input:?} should be malformed"
            );
        }
    }
}
