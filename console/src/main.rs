use anyhow::Context;

use water_monitor_common::dashboard::{
    build_frame, AxisSide, DashboardConfig, DashboardData, DashboardFrame, FrameOutcome,
    TimePoint, NO_DATA_WARNING,
};
use water_monitor_common::telemetry::clock::{Clock, SystemClock};
use water_monitor_common::telemetry::period::{recent_months, PeriodSelector};
use water_monitor_common::telemetry::{
    DeviceId, DeviceSelection, DummyTelemetryController, SheetTelemetryController,
    TelemetryControllerPointer, TelemetryControllerSharedPointer,
};
use water_monitor_common::ValueStore;

/// Our App struct that holds the telemetry controller and the dashboard configuration.
///
/// A background thread rebuilds the dashboard frame on a fixed interval and
/// publishes it through a [`ValueStore`]; the foreground loop takes the
/// freshest frame and renders it as text. Fetching and filtering never touch
/// the rendering side.
struct App {
    controller: TelemetryControllerSharedPointer,
    config: DashboardConfig,
    frames: ValueStore<DashboardFrame>,
}

impl App {
    const REFRESH_INTERVAL: std::time::Duration = std::time::Duration::from_millis(500);

    /// Create a new App struct from the environment.
    ///
    /// With WATER_MONITOR_OFFLINE set, readings come from the embedded
    /// fixture instead of the spreadsheet export.
    fn new() -> anyhow::Result<Self> {
        use std::sync::{Arc, Mutex};

        let controller: TelemetryControllerPointer =
            if std::env::var_os("WATER_MONITOR_OFFLINE").is_some() {
                Box::new(DummyTelemetryController::new())
            } else {
                Box::new(
                    SheetTelemetryController::new()
                        .map_err(|e| anyhow::anyhow!("cannot set up the sheet controller: {e}"))?,
                )
            };

        Ok(Self {
            controller: Arc::new(Mutex::new(controller)),
            config: config_from_env()?,
            frames: ValueStore::default(),
        })
    }

    /// Run the App: start the polling thread and render frames as they arrive.
    fn run(&mut self) -> anyhow::Result<()> {
        log::info!(
            "Polling {:?} every {:?}",
            self.config.selection,
            Self::REFRESH_INTERVAL
        );

        let controller = self.controller.clone();
        let config = self.config;
        let frames = self.frames.clone();

        std::thread::spawn(move || {
            let clock = SystemClock;
            loop {
                let frame = {
                    let controller = controller.lock().unwrap();
                    build_frame(controller.as_ref(), &config, &clock)
                };
                frames.set(frame);
                std::thread::sleep(Self::REFRESH_INTERVAL);
            }
        });

        loop {
            if let Some(frame) = self.frames.get() {
                render_frame(&frame);
            }
            std::thread::sleep(Self::REFRESH_INTERVAL);
        }
    }
}

/// The per-cycle configuration, read once at startup and threaded explicitly.
///
/// WATER_MONITOR_DEVICE: device1..device6 or "all" (default device1).
/// WATER_MONITOR_PERIOD: all | daily | monthly (default all).
/// WATER_MONITOR_DATE: YYYY-MM-DD, explicit day for the daily period.
/// WATER_MONITOR_MONTH: YYYY-MM, explicit month for the monthly period.
fn config_from_env() -> anyhow::Result<DashboardConfig> {
    let selection = match std::env::var("WATER_MONITOR_DEVICE") {
        Ok(value) if value == "all" => DeviceSelection::AllDevices,
        Ok(value) => DeviceSelection::One(value.parse().map_err(anyhow::Error::msg)?),
        Err(_) => DeviceSelection::One(DeviceId::Device1),
    };

    let period = match std::env::var("WATER_MONITOR_PERIOD").ok().as_deref() {
        None | Some("all") => PeriodSelector::All,
        Some("daily") => PeriodSelector::Daily(parse_date_env("WATER_MONITOR_DATE")?),
        Some("monthly") => {
            let month = parse_month_env("WATER_MONITOR_MONTH")?;
            if let Some(month) = month {
                // The month picker only offers the trailing six months.
                let offered = recent_months(SystemClock.today(), 6);
                anyhow::ensure!(
                    offered.contains(&month),
                    "WATER_MONITOR_MONTH must be one of the trailing 6 months ({})",
                    offered
                        .iter()
                        .map(|(year, month)| format!("{year}-{month:02}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            PeriodSelector::Monthly(month)
        }
        Some(other) => anyhow::bail!("unknown period: {other} (expected all, daily or monthly)"),
    };

    Ok(DashboardConfig { selection, period })
}

fn parse_date_env(name: &str) -> anyhow::Result<Option<chrono::NaiveDate>> {
    match std::env::var(name) {
        Ok(value) => {
            let date = value
                .parse()
                .with_context(|| format!("{name} must be YYYY-MM-DD, got {value:?}"))?;
            Ok(Some(date))
        }
        Err(_) => Ok(None),
    }
}

fn parse_month_env(name: &str) -> anyhow::Result<Option<(i32, u32)>> {
    match std::env::var(name) {
        Ok(value) => {
            let (year, month) = value
                .split_once('-')
                .with_context(|| format!("{name} must be YYYY-MM, got {value:?}"))?;
            let year = year
                .parse()
                .with_context(|| format!("{name}: bad year in {value:?}"))?;
            let month: u32 = month
                .parse()
                .with_context(|| format!("{name}: bad month in {value:?}"))?;
            anyhow::ensure!((1..=12).contains(&month), "{name}: month out of range");
            Ok(Some((year, month)))
        }
        Err(_) => Ok(None),
    }
}

fn render_frame(frame: &DashboardFrame) {
    println!();
    println!(
        "=== Water Quality Monitoring System, {} ===",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    for error in &frame.fetch_errors {
        println!("ERROR: {error}");
    }
    for warning in &frame.warnings {
        println!("WARNING: {warning}");
    }

    match &frame.outcome {
        FrameOutcome::NoData => println!("{NO_DATA_WARNING}"),
        FrameOutcome::NoPeriodData { warning } => println!("{warning}"),
        FrameOutcome::Ready(data) => render_data(data),
    }
}

fn render_data(data: &DashboardData) {
    println!("Latest Water Quality");
    for metric in &data.metrics {
        println!("  {:<13} {}", metric.label, metric.formatted());
    }

    println!("Device data table ({} rows)", data.table.len());
    println!(
        "  {:<19} {:>12} {:>11} {:>9} {:>9} {:>10}",
        "Timestamp", "conductivity", "temperature", "turbidity", "latitude", "longitude"
    );
    for reading in &data.table {
        println!(
            "  {:<19} {:>12.2} {:>11.2} {:>9.2} {:>9} {:>10}",
            reading.timestamp.format("%Y-%m-%d %H:%M:%S"),
            reading.conductivity,
            reading.temperature,
            reading.turbidity,
            format_coordinate(reading.latitude),
            format_coordinate(reading.longitude),
        );
    }

    let chart = &data.chart;
    println!("{} ({} / time)", chart.title, chart.x_title);
    for series in &chart.series {
        let side = match series.axis.side {
            AxisSide::Left => "left",
            AxisSide::Right => "right",
        };
        println!(
            "  {:<13} {} axis \"{}\" at {:.2}, color {}: {}",
            series.name,
            side,
            series.axis.title,
            series.axis.position,
            series.axis.color,
            summarize_points(&series.points),
        );
    }

    match &data.map {
        Some(map) => println!(
            "Device Locations: marker at ({:.4}, {:.4}), zoom {}: {}",
            map.latitude, map.longitude, map.zoom, map.marker_popup
        ),
        None => println!("Device Locations: not available"),
    }
}

fn format_coordinate(value: Option<f64>) -> String {
    match value {
        Some(coordinate) => format!("{coordinate:.4}"),
        None => "N/A".to_string(),
    }
}

fn summarize_points(points: &[TimePoint]) -> String {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for point in points {
        min = min.min(point.value);
        max = max.max(point.value);
    }

    format!("{} points, range {min:.2}..{max:.2}", points.len())
}

/// A minimal main function that initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut app = App::new()?;

    app.run()
}
