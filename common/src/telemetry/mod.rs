mod telemetrycontroller;
mod dummytelemetrycontroller;

pub use telemetrycontroller::DeviceId;
pub use telemetrycontroller::DeviceSelection;
pub use telemetrycontroller::Reading;
pub use telemetrycontroller::ReadingTable;
pub use telemetrycontroller::TelemetryController;
pub use telemetrycontroller::TelemetryControllerPointer;
pub use telemetrycontroller::TelemetryControllerSharedPointer;

pub use dummytelemetrycontroller::DummyTelemetryController;

#[cfg(feature = "sheets")]
mod sheettelemetrycontroller;

#[cfg(feature = "sheets")]
pub use sheettelemetrycontroller::SheetTelemetryController;

pub mod clock;
pub mod csvrecords;
pub mod period;
