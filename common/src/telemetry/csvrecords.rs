//! Decoding of the CSV sheet export into [`ReadingTable`]s.
//!
//! The export carries separate `date` and `time` text columns; they are
//! joined with a single space and parsed as one timestamp. Sensor columns
//! must be numeric; a bad cell fails the whole parse and the caller
//! degrades to an empty table. Coordinates are coerced leniently: text that
//! is not a number becomes `None`.

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::telemetry::{Reading, ReadingTable};

/// Timestamp layouts accepted for the combined `date time` string, tried in
/// order. Covers ISO-style sheets and the US default of the sheet service.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// One CSV row as exported, before typing. Columns beyond these are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    date: String,
    time: String,
    conductivity: f64,
    turbidity: f64,
    temperature: f64,
    latitude: String,
    longitude: String,
}

impl RawRecord {
    fn into_reading(self) -> Result<Reading, Box<dyn std::error::Error>> {
        Ok(Reading {
            timestamp: parse_timestamp(&self.date, &self.time)?,
            conductivity: self.conductivity,
            turbidity: self.turbidity,
            temperature: self.temperature,
            latitude: parse_coordinate(&self.latitude),
            longitude: parse_coordinate(&self.longitude),
        })
    }
}

fn parse_timestamp(date: &str, time: &str) -> Result<NaiveDateTime, Box<dyn std::error::Error>> {
    let combined = format!("{} {}", date.trim(), time.trim());

    for format in TIMESTAMP_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(&combined, format) {
            return Ok(timestamp);
        }
    }

    Err(format!("unparsable timestamp: {combined:?}").into())
}

fn parse_coordinate(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

/// Parses a CSV payload into a table, in source row order.
pub fn parse_readings(text: &str) -> Result<ReadingTable, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut table = ReadingTable::new();
    for record in reader.deserialize::<RawRecord>() {
        table.push(record?.into_reading()?);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
date,time,conductivity,turbidity,temperature,latitude,longitude
2024-01-01,08:30:00,640.25,3.1,27.5,6.9271,79.8612
2024-01-02,09:00:00,655.00,2.8,27.9,6.9275,79.8620
";

    #[test]
    fn parses_rows_in_source_order() {
        let table = parse_readings(SAMPLE).unwrap();

        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(
            first.timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap()
        );
        assert_eq!(first.conductivity, 640.25);
        assert_eq!(first.turbidity, 3.1);
        assert_eq!(first.temperature, 27.5);
        assert_eq!(first.coordinates(), Some((6.9271, 79.8612)));
    }

    #[test]
    fn non_numeric_coordinates_become_missing() {
        let text = "\
date,time,conductivity,turbidity,temperature,latitude,longitude
2024-01-01,08:30:00,640.25,3.1,27.5,N/A,79.8612
";
        let table = parse_readings(text).unwrap();

        let row = &table.rows()[0];
        assert_eq!(row.latitude, None);
        assert_eq!(row.longitude, Some(79.8612));
        assert_eq!(row.coordinates(), None);
    }

    #[test]
    fn accepts_us_style_dates_and_minute_precision() {
        let text = "\
date,time,conductivity,turbidity,temperature,latitude,longitude
01/31/2024,23:59,640.25,3.1,27.5,6.9271,79.8612
";
        let table = parse_readings(text).unwrap();

        assert_eq!(
            table.rows()[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 31)
                .unwrap()
                .and_hms_opt(23, 59, 0)
                .unwrap()
        );
    }

    #[test]
    fn extra_columns_are_ignored() {
        let text = "\
date,time,conductivity,turbidity,temperature,latitude,longitude,battery
2024-01-01,08:30:00,640.25,3.1,27.5,6.9271,79.8612,87
";
        assert_eq!(parse_readings(text).unwrap().len(), 1);
    }

    #[test]
    fn bad_sensor_cell_fails_the_parse() {
        let text = "\
date,time,conductivity,turbidity,temperature,latitude,longitude
2024-01-01,08:30:00,not-a-number,3.1,27.5,6.9271,79.8612
";
        assert!(parse_readings(text).is_err());
    }

    #[test]
    fn bad_timestamp_fails_the_parse() {
        let text = "\
date,time,conductivity,turbidity,temperature,latitude,longitude
yesterday,late,640.25,3.1,27.5,6.9271,79.8612
";
        assert!(parse_readings(text).is_err());
    }
}
