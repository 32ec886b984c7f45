/// Decade-cycle polar projection of the annual mean sea level series.
///
/// Each year becomes a point whose angle is its position within its
/// decade (year 0 at 0 rad, year 9 at 1.8π) and whose radius encodes the
/// level. The animation plan lists, frame by frame, what a renderer should
/// draw: points revealed one per frame followed by a hold at the end.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::f64::consts::TAU;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::analysis::trend::decade_of;
use crate::model::{CrawlError, Dataset};
use crate::persist::{create_product_file, timestamp_tag};

pub const FRAME_INTERVAL_MS: u64 = 300;
pub const PAUSE_FRAMES: usize = 60;

/// Radius range used by `RadiusMode::Normalized`.
const NORMALIZED_MIN_RADIUS: f64 = 1.0;
const NORMALIZED_MAX_RADIUS: f64 = 5.0;

/// Ring 1 is the 1950s.
const FIRST_RING_DECADE: i32 = 1950;
/// Level at which a point sits exactly on its decade ring.
const RING_PIVOT_M: f64 = 1.35;
/// Ring offset per metre away from the pivot.
const RING_GAIN_PER_M: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusMode {
    /// Minimum level maps to radius 1, maximum to 5.
    Normalized,
    /// One ring per decade with the level as an offset from the ring.
    DecadeRings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolarPoint {
    pub year: i32,
    pub level_m: f64,
    pub decade: i32,
    pub year_in_decade: i32,
    pub angle_rad: f64,
    pub radius: f64,
    /// 0.0 for the first year, 1.0 for the last; drives the colour ramp.
    pub time_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadiusTick {
    pub radius: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub index: usize,
    /// Points 0..visible_points are drawn and joined in order.
    pub visible_points: usize,
    pub current_year: i32,
    pub progress_pct: f64,
    pub labels: Vec<i32>,
    pub hold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationPlan {
    pub mode: RadiusMode,
    pub frame_interval_ms: u64,
    pub max_radius: f64,
    pub radius_ticks: Vec<RadiusTick>,
    pub points: Vec<PolarPoint>,
    pub frames: Vec<Frame>,
}

pub fn angle_for_year(year: i32) -> f64 {
    year.rem_euclid(10) as f64 / 10.0 * TAU
}

fn ring_index(year: i32) -> f64 {
    ((decade_of(year) - FIRST_RING_DECADE) / 10) as f64
}

/// Projects every record to polar coordinates.
pub fn project(dataset: &Dataset, mode: RadiusMode) -> Vec<PolarPoint> {
    let levels: Vec<f64> = dataset.records().iter().map(|r| r.mean_sea_level_m).collect();
    let min = levels.iter().copied().fold(f64::INFINITY, f64::min);
    let max = levels.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (first, last) = match (dataset.first_year(), dataset.last_year()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Vec::new(),
    };

    dataset
        .records()
        .iter()
        .map(|r| {
            let radius = match mode {
                RadiusMode::Normalized => normalized_radius(r.mean_sea_level_m, min, max),
                RadiusMode::DecadeRings => {
                    ring_index(r.year) + 1.0 + (r.mean_sea_level_m - RING_PIVOT_M) * RING_GAIN_PER_M
                }
            };
            PolarPoint {
                year: r.year,
                level_m: r.mean_sea_level_m,
                decade: decade_of(r.year),
                year_in_decade: r.year.rem_euclid(10),
                angle_rad: angle_for_year(r.year),
                radius,
                time_fraction: if last == first {
                    0.0
                } else {
                    (r.year - first) as f64 / (last - first) as f64
                },
            }
        })
        .collect()
}

/// A flat series sits on the innermost radius.
fn normalized_radius(level: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return NORMALIZED_MIN_RADIUS;
    }
    NORMALIZED_MIN_RADIUS + (level - min) / (max - min) * (NORMALIZED_MAX_RADIUS - NORMALIZED_MIN_RADIUS)
}

/// Tick positions with labels in the units a reader expects: metres for
/// the normalized scale, decade names for rings.
pub fn radius_ticks(dataset: &Dataset, mode: RadiusMode) -> Vec<RadiusTick> {
    match mode {
        RadiusMode::Normalized => {
            let levels = dataset.levels();
            let min = levels.iter().map(|l| l.1).fold(f64::INFINITY, f64::min);
            let max = levels.iter().map(|l| l.1).fold(f64::NEG_INFINITY, f64::max);
            if levels.is_empty() {
                return Vec::new();
            }
            (1..=5)
                .map(|r| {
                    let radius = r as f64;
                    let level = min
                        + (radius - NORMALIZED_MIN_RADIUS)
                            / (NORMALIZED_MAX_RADIUS - NORMALIZED_MIN_RADIUS)
                            * (max - min);
                    RadiusTick {
                        radius,
                        label: format!("{:.2}m", level),
                    }
                })
                .collect()
        }
        RadiusMode::DecadeRings => {
            let Some(last) = dataset.last_year() else {
                return Vec::new();
            };
            let rings = ring_index(last) as i32 + 1;
            (0..rings)
                .map(|i| RadiusTick {
                    radius: (i + 1) as f64,
                    label: format!("{}s", FIRST_RING_DECADE + i * 10),
                })
                .collect()
        }
    }
}

/// Years labelled when point `current` is the newest one shown.
fn labels_through(points: &[PolarPoint], current: usize) -> Vec<i32> {
    points[..=current]
        .iter()
        .enumerate()
        .filter(|(i, p)| *i == 0 || *i == current || p.year % 5 == 0)
        .map(|(_, p)| p.year)
        .collect()
}

/// Builds the full frame plan. `None` for an empty dataset.
pub fn plan_animation(dataset: &Dataset, mode: RadiusMode) -> Option<AnimationPlan> {
    let points = project(dataset, mode);
    if points.is_empty() {
        return None;
    }
    let n = points.len();

    let frames = (0..n + PAUSE_FRAMES)
        .map(|index| {
            let current = index.min(n - 1);
            Frame {
                index,
                visible_points: current + 1,
                current_year: points[current].year,
                progress_pct: (current + 1) as f64 / n as f64 * 100.0,
                labels: labels_through(&points, current),
                hold: index >= n,
            }
        })
        .collect();

    let max_radius = match mode {
        RadiusMode::Normalized => NORMALIZED_MAX_RADIUS + 1.0,
        RadiusMode::DecadeRings => ring_index(points[n - 1].year) + 3.0,
    };

    Some(AnimationPlan {
        mode,
        frame_interval_ms: FRAME_INTERVAL_MS,
        max_radius,
        radius_ticks: radius_ticks(dataset, mode),
        points,
        frames,
    })
}

pub fn plan_path(dir: &Path, station_code: &str, at: &DateTime<Local>) -> PathBuf {
    dir.join(format!("HKO_{}_DecadeCycle_{}.json", station_code, timestamp_tag(at)))
}

/// Writes the plan as pretty JSON to a new timestamped file.
pub fn write_plan(
    dir: &Path,
    station_code: &str,
    plan: &AnimationPlan,
    at: &DateTime<Local>,
) -> Result<PathBuf, CrawlError> {
    let path = plan_path(dir, station_code, at);
    let mut writer = create_product_file(&path)?;
    serde_json::to_writer_pretty(&mut writer, plan)
        .map_err(|e| CrawlError::io(&path, std::io::Error::other(e)))?;
    writer.flush().map_err(|e| CrawlError::io(&path, e))?;
    Ok(path)
}
