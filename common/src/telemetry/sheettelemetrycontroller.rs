use crate::telemetry::csvrecords::parse_readings;
use crate::telemetry::{DeviceId, ReadingTable, TelemetryController};

/// The identifier of the public spreadsheet holding one sheet per device.
pub const SPREADSHEET_ID: &str = "1goJqD5eK8J6bayJlqC0RgEmxkDnmTOW6Jfzr3_cjwAQ";

/// Telemetry controller backed by the public CSV export of the spreadsheet.
///
/// Each device is one sheet; the sheet name is appended to the fixed export
/// base URL as a query parameter. The trait surface is synchronous, so the
/// async HTTP client runs on a private runtime behind `block_on`.
pub struct SheetTelemetryController {
    base_url: String,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl SheetTelemetryController {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_base_url(format!(
            "https://docs.google.com/spreadsheets/d/{SPREADSHEET_ID}/gviz/tq?tqx=out:csv&sheet="
        ))
    }

    /// A controller reading from a different export endpoint. Lets tests and
    /// mirrors stand in for the live spreadsheet.
    pub fn with_base_url(base_url: String) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
            runtime: tokio::runtime::Runtime::new()?,
        })
    }

    fn sheet_url(&self, device: DeviceId) -> String {
        format!("{}{}", self.base_url, device)
    }

    async fn download(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.text().await
    }
}

impl TelemetryController for SheetTelemetryController {
    fn fetch(&self, device: DeviceId) -> Result<ReadingTable, Box<dyn std::error::Error>> {
        let url = self.sheet_url(device);
        log::debug!("Fetching sheet: {url}");

        let body = self.runtime.block_on(self.download(&url))?;
        let table = parse_readings(&body)?;
        log::debug!("Fetched {} readings from {device}", table.len());

        Ok(table)
    }
}

#[test]
fn test_sheet_url_appends_the_device_sheet_name() {
    let controller =
        SheetTelemetryController::with_base_url("https://sheets.test/export?sheet=".into())
            .unwrap();

    assert_eq!(
        controller.sheet_url(DeviceId::Device4),
        "https://sheets.test/export?sheet=device4"
    );
}

#[test]
fn test_unreachable_source_is_an_error_not_a_panic() {
    let controller =
        SheetTelemetryController::with_base_url("http://127.0.0.1:9/export?sheet=".into())
            .unwrap();

    assert!(controller.fetch(DeviceId::Device1).is_err());
}
