use crate::telemetry::csvrecords::parse_readings;
use crate::telemetry::{DeviceId, ReadingTable, TelemetryController};

/// Telemetry controller serving an embedded CSV fixture, for offline runs
/// and tests. The fixture goes through the real CSV decode path; every
/// device reports the same sheet.
#[derive(Default)]
pub struct DummyTelemetryController;

impl DummyTelemetryController {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetryController for DummyTelemetryController {
    fn fetch(&self, _device: DeviceId) -> Result<ReadingTable, Box<dyn std::error::Error>> {
        let csv_data = std::include_str!("./dummyreadings.csv");

        parse_readings(csv_data)
    }
}

#[test]
fn test_dummy_telemetry_controller() {
    let controller = DummyTelemetryController::new();
    let table = controller.fetch(DeviceId::Device1).unwrap();

    assert_eq!(table.len(), 9);

    // The 12:00 row of 2024-01-02 carries an unparsable latitude.
    let partial = &table.rows()[4];
    assert_eq!(partial.latitude, None);
    assert_eq!(partial.longitude, Some(79.8617));
}
