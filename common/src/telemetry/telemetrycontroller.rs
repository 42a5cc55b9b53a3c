use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// One of the six telemetry devices publishing a sheet of readings.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceId {
    Device1,
    Device2,
    Device3,
    Device4,
    Device5,
    Device6,
}

impl DeviceId {
    /// All devices, in the fixed fetch order.
    pub const ALL: [DeviceId; 6] = [
        DeviceId::Device1,
        DeviceId::Device2,
        DeviceId::Device3,
        DeviceId::Device4,
        DeviceId::Device5,
        DeviceId::Device6,
    ];

    /// The sheet name of the device, as used in the export URL.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceId::Device1 => "device1",
            DeviceId::Device2 => "device2",
            DeviceId::Device3 => "device3",
            DeviceId::Device4 => "device4",
            DeviceId::Device5 => "device5",
            DeviceId::Device6 => "device6",
        }
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceId::ALL
            .into_iter()
            .find(|device| device.as_str() == s)
            .ok_or_else(|| format!("unknown device id: {s}"))
    }
}

/// The device choice for one refresh cycle: a single device or all of them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeviceSelection {
    #[default]
    AllDevices,
    One(DeviceId),
}

impl DeviceSelection {
    /// The devices to fetch this cycle, in fetch order.
    pub fn devices(&self) -> Vec<DeviceId> {
        match self {
            DeviceSelection::AllDevices => DeviceId::ALL.to_vec(),
            DeviceSelection::One(device) => vec![*device],
        }
    }
}

/// One timestamped row of sensor and position data.
///
/// Coordinates are optional: a source cell that does not parse as a number
/// is carried as `None`, never as a zero sentinel.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Reading {
    pub timestamp: NaiveDateTime,

    /// Conductivity in parts per million.
    pub conductivity: f64,

    /// Turbidity in NTU.
    pub turbidity: f64,

    /// Temperature in °C.
    pub temperature: f64,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Reading {
    /// Both coordinates, if the reading carries a usable position.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// An ordered table of readings, one fetch (or concatenation of fetches) worth.
///
/// Rows keep their source order; timestamps are not required to be unique or
/// sorted until [`ReadingTable::sorted_by_timestamp`] is called. The table is
/// rebuilt from scratch every refresh cycle.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ReadingTable {
    rows: Vec<Reading>,
}

impl ReadingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reading: Reading) {
        self.rows.push(reading);
    }

    /// Appends all rows of `other` after the rows already present.
    pub fn append(&mut self, other: ReadingTable) {
        self.rows.extend(other.rows);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.rows.iter()
    }

    pub fn rows(&self) -> &[Reading] {
        &self.rows
    }

    /// A copy of the table sorted by timestamp ascending. The sort is stable,
    /// so rows with equal timestamps keep their source order.
    pub fn sorted_by_timestamp(&self) -> ReadingTable {
        let mut rows = self.rows.clone();
        rows.sort_by_key(|reading| reading.timestamp);
        ReadingTable { rows }
    }

    /// The chronologically last reading, if the table is non-empty.
    pub fn latest(&self) -> Option<Reading> {
        self.sorted_by_timestamp().rows.pop()
    }
}

impl From<Vec<Reading>> for ReadingTable {
    fn from(rows: Vec<Reading>) -> Self {
        Self { rows }
    }
}

impl<'a> IntoIterator for &'a ReadingTable {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

pub type TelemetryControllerPointer = Box<dyn TelemetryController + Send>;

pub type TelemetryControllerSharedPointer = Arc<Mutex<TelemetryControllerPointer>>;

/// The telemetry controller trait that provides per-device readings.
pub trait TelemetryController {
    /// Fetches the full reading table of one device.
    fn fetch(&self, device: DeviceId) -> Result<ReadingTable, Box<dyn std::error::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(timestamp: &str) -> Reading {
        Reading {
            timestamp: NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").unwrap(),
            conductivity: 100.0,
            turbidity: 1.0,
            temperature: 20.0,
            latitude: Some(6.9271),
            longitude: Some(79.8612),
        }
    }

    #[test]
    fn device_id_round_trips_through_str() {
        for device in DeviceId::ALL {
            assert_eq!(device.as_str().parse::<DeviceId>().unwrap(), device);
        }
        assert!("device7".parse::<DeviceId>().is_err());
    }

    #[test]
    fn selection_yields_fetch_order() {
        assert_eq!(DeviceSelection::AllDevices.devices(), DeviceId::ALL.to_vec());
        assert_eq!(
            DeviceSelection::One(DeviceId::Device3).devices(),
            vec![DeviceId::Device3]
        );
    }

    #[test]
    fn append_preserves_source_order() {
        let mut first = ReadingTable::from(vec![
            reading("2024-01-01 08:00:00"),
            reading("2024-01-01 09:00:00"),
            reading("2024-01-01 10:00:00"),
        ]);
        let second = ReadingTable::from(vec![
            reading("2024-01-01 07:00:00"),
            reading("2024-01-01 07:30:00"),
            reading("2024-01-01 07:45:00"),
        ]);

        let expected: Vec<Reading> = first.iter().chain(second.iter()).cloned().collect();
        first.append(second.clone());

        assert_eq!(first.len(), 6);
        assert_eq!(first.rows(), expected.as_slice());
    }

    #[test]
    fn latest_is_the_chronologically_last_row() {
        let table = ReadingTable::from(vec![
            reading("2024-01-02 08:00:00"),
            reading("2024-01-03 08:00:00"),
            reading("2024-01-01 08:00:00"),
        ]);

        let latest = table.latest().unwrap();
        assert_eq!(
            latest.timestamp.date(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
    }

    #[test]
    fn missing_coordinates_are_not_a_position() {
        let mut partial = reading("2024-01-01 08:00:00");
        partial.latitude = None;

        assert_eq!(partial.coordinates(), None);
        assert_eq!(
            reading("2024-01-01 08:00:00").coordinates(),
            Some((6.9271, 79.8612))
        );
    }
}
