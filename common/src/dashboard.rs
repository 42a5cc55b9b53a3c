//! The dashboard refresh cycle.
//!
//! [`build_frame`] runs one full fetch → concatenate → filter → derive pass
//! and returns everything a frontend needs for one render, so the cycle is
//! testable without any UI attached. Configuration is threaded in explicitly
//! per cycle; nothing is read from ambient state.

use chrono::NaiveDateTime;

use crate::telemetry::clock::Clock;
use crate::telemetry::period::{PeriodSelector, ResolvedPeriod};
use crate::telemetry::{DeviceSelection, Reading, ReadingTable, TelemetryController};

/// The explicit per-cycle configuration: which devices, which period.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DashboardConfig {
    pub selection: DeviceSelection,
    pub period: PeriodSelector,
}

/// One scalar tile, shown with two decimals and a fixed unit suffix.
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    pub label: &'static str,
    pub value: f64,
    pub unit: &'static str,
}

impl Metric {
    pub fn formatted(&self) -> String {
        format!("{:.2} {}", self.value, self.unit)
    }
}

/// One chart sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimePoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisSide {
    Left,
    Right,
}

/// Where a series' value axis sits and how it is colored. Each axis is
/// pinned to its own horizontal position so the three scales do not overlap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisSpec {
    pub title: &'static str,
    pub color: &'static str,
    pub side: AxisSide,
    pub position: f64,
}

/// One line of the time chart, with its dedicated value axis.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesSpec {
    pub name: &'static str,
    pub axis: AxisSpec,
    pub points: Vec<TimePoint>,
}

/// The three-series chart over one shared time axis.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSpec {
    pub title: &'static str,
    pub x_title: &'static str,
    pub x_domain: (f64, f64),
    pub series: Vec<SeriesSpec>,
}

/// A single-marker map centered on the latest reading.
#[derive(Clone, Debug, PartialEq)]
pub struct MapSpec {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub marker_popup: String,
}

/// The renderable result of a successful cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardData {
    pub latest: Reading,
    pub metrics: [Metric; 3],
    pub table: ReadingTable,
    pub chart: ChartSpec,
    /// `None` when the latest reading carries no usable coordinates; the
    /// frame then carries a warning instead of a map.
    pub map: Option<MapSpec>,
}

/// How far the cycle got.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// The fetches produced no rows at all.
    NoData,
    /// Rows exist, but none fall inside the selected period.
    NoPeriodData { warning: String },
    Ready(DashboardData),
}

/// Everything one render pass needs. Rebuilt from scratch every cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardFrame {
    /// Per-device fetch failures, already degraded to empty tables.
    pub fetch_errors: Vec<String>,
    pub warnings: Vec<String>,
    pub outcome: FrameOutcome,
}

/// Shown when the fetches produced no rows at all.
pub const NO_DATA_WARNING: &str = "No data available to display for the selected device(s).";
const NO_DAY_WARNING: &str = "No data available for the selected day.";
const NO_MONTH_WARNING: &str = "No data available for the selected Month.";

/// Runs one full refresh cycle.
///
/// Devices are fetched sequentially in fixed order; a failing fetch is
/// logged, recorded on the frame, and contributes an empty table. The
/// combined table is filtered by the resolved period, the chronologically
/// last row becomes the latest reading, and the presentation data is built
/// from there.
pub fn build_frame(
    controller: &dyn TelemetryController,
    config: &DashboardConfig,
    clock: &dyn Clock,
) -> DashboardFrame {
    let mut fetch_errors = Vec::new();
    let mut warnings = Vec::new();

    let mut combined = ReadingTable::new();
    for device in config.selection.devices() {
        match controller.fetch(device) {
            Ok(table) => combined.append(table),
            Err(e) => {
                log::warn!("Failed to fetch data for {device}: {e}");
                fetch_errors.push(format!("Failed to fetch data for {device}: {e}"));
            }
        }
    }

    if combined.is_empty() {
        log::warn!("{NO_DATA_WARNING}");
        return DashboardFrame {
            fetch_errors,
            warnings,
            outcome: FrameOutcome::NoData,
        };
    }

    let period = config.period.resolve(clock);
    let filtered = combined.filter_period(&period);

    let Some(latest) = filtered.latest() else {
        let warning = match period {
            ResolvedPeriod::Day(_) => NO_DAY_WARNING,
            _ => NO_MONTH_WARNING,
        };
        log::warn!("{warning}");
        return DashboardFrame {
            fetch_errors,
            warnings,
            outcome: FrameOutcome::NoPeriodData {
                warning: warning.to_string(),
            },
        };
    };

    let metrics = [
        Metric {
            label: "Conductivity",
            value: latest.conductivity,
            unit: "ppm",
        },
        Metric {
            label: "Turbidity",
            value: latest.turbidity,
            unit: "NTU",
        },
        Metric {
            label: "Temperature",
            value: latest.temperature,
            unit: "°C",
        },
    ];

    let chart = build_chart(&filtered);
    let map = build_map(&latest);
    if map.is_none() {
        let warning = "The latest reading has no usable coordinates; skipping the location map.";
        log::warn!("{warning}");
        warnings.push(warning.to_string());
    }

    DashboardFrame {
        fetch_errors,
        warnings,
        outcome: FrameOutcome::Ready(DashboardData {
            latest,
            metrics,
            table: filtered,
            chart,
            map,
        }),
    }
}

fn build_chart(table: &ReadingTable) -> ChartSpec {
    let series_points = |value: fn(&Reading) -> f64| -> Vec<TimePoint> {
        table
            .iter()
            .map(|reading| TimePoint {
                timestamp: reading.timestamp,
                value: value(reading),
            })
            .collect()
    };

    ChartSpec {
        title: "Water Quality Over Time",
        x_title: "Time",
        x_domain: (0.1, 0.9),
        series: vec![
            SeriesSpec {
                name: "conductivity",
                axis: AxisSpec {
                    title: "Conductivity",
                    color: "#1f77b4",
                    side: AxisSide::Left,
                    position: 0.0,
                },
                points: series_points(|r| r.conductivity),
            },
            SeriesSpec {
                name: "turbidity",
                axis: AxisSpec {
                    title: "Turbidity",
                    color: "#ff7f0e",
                    side: AxisSide::Right,
                    position: 1.0,
                },
                points: series_points(|r| r.turbidity),
            },
            SeriesSpec {
                name: "temperature",
                axis: AxisSpec {
                    title: "Temperature (°C)",
                    color: "#d62728",
                    side: AxisSide::Right,
                    position: 0.95,
                },
                points: series_points(|r| r.temperature),
            },
        ],
    }
}

fn build_map(latest: &Reading) -> Option<MapSpec> {
    let (latitude, longitude) = latest.coordinates()?;

    Some(MapSpec {
        latitude,
        longitude,
        zoom: 10,
        marker_popup: format!(
            "Time: {}, Conductivity={}ppm, Turbidity={}NTU, Temperature={}°C",
            latest.timestamp, latest.conductivity, latest.turbidity, latest.temperature
        ),
    })
}
