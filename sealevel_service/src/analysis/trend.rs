/// Descriptive statistics and linear trends over a persisted dataset.
///
/// All levels are metres; rates are reported per year and converted to
/// millimetres or centimetres only at the presentation layer.

use serde::Serialize;

use crate::model::{Dataset, Record};

/// Decades with fewer years than this are left out of decadal averages.
pub const MIN_YEARS_PER_DECADE: usize = 5;

// ---------------------------------------------------------------------------
// Linear fit
// ---------------------------------------------------------------------------

/// Least-squares line `value = slope * year + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    /// Metres per year.
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn value_at(&self, year: f64) -> f64 {
        self.slope * year + self.intercept
    }

    pub fn cm_per_decade(&self) -> f64 {
        self.slope * 1000.0
    }

    pub fn mm_per_year(&self) -> f64 {
        self.slope * 1000.0
    }

    /// Change along the fitted line across `years` years, in centimetres.
    pub fn change_over_cm(&self, years: f64) -> f64 {
        self.slope * years * 100.0
    }
}

/// Fits a line through `(x, y)` points. `None` for fewer than two points
/// or when every `x` is the same.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in points {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Mean sea level trend over records from `since` onward (all records when
/// `since` is `None`).
pub fn sea_level_trend(dataset: &Dataset, since: Option<i32>) -> Option<LinearFit> {
    let points: Vec<(f64, f64)> = dataset
        .records()
        .iter()
        .filter(|r| since.is_none_or(|s| r.year >= s))
        .map(|r| (r.year as f64, r.mean_sea_level_m))
        .collect();
    linear_fit(&points)
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeaLevelStats {
    pub count: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub mean_m: f64,
    /// Sample standard deviation (n - 1); zero for a single record.
    pub std_dev_m: f64,
    pub max_m: f64,
    pub max_year: i32,
    pub min_m: f64,
    pub min_year: i32,
}

impl SeaLevelStats {
    pub fn compute(dataset: &Dataset) -> Option<SeaLevelStats> {
        let records = dataset.records();
        let first = records.first()?;
        let last = records.last()?;

        let levels: Vec<f64> = records.iter().map(|r| r.mean_sea_level_m).collect();
        let (mean_m, std_dev_m) = mean_and_sample_std(&levels);

        // First occurrence wins on ties.
        let mut max = first;
        let mut min = first;
        for r in records {
            if r.mean_sea_level_m > max.mean_sea_level_m {
                max = r;
            }
            if r.mean_sea_level_m < min.mean_sea_level_m {
                min = r;
            }
        }

        Some(SeaLevelStats {
            count: records.len(),
            first_year: first.year,
            last_year: last.year,
            mean_m,
            std_dev_m,
            max_m: max.mean_sea_level_m,
            max_year: max.year,
            min_m: min.mean_sea_level_m,
            min_year: min.year,
        })
    }

    pub fn range_m(&self) -> f64 {
        self.max_m - self.min_m
    }
}

fn mean_and_sample_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}

// ---------------------------------------------------------------------------
// Series derived per year
// ---------------------------------------------------------------------------

/// Change from the previous record, keyed by the later year. Gaps in the
/// year sequence are not interpolated.
pub fn year_over_year_changes(dataset: &Dataset) -> Vec<(i32, f64)> {
    dataset
        .records()
        .windows(2)
        .map(|w| (w[1].year, w[1].mean_sea_level_m - w[0].mean_sea_level_m))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidalRange {
    pub year: i32,
    /// MHHW - MLLW.
    pub total_m: f64,
    /// MHHW - MLHW, when MLHW is present.
    pub high_water_m: Option<f64>,
    /// MHLW - MLLW, when MHLW is present.
    pub low_water_m: Option<f64>,
}

/// Tidal ranges for the years that carry both extremes.
pub fn tidal_ranges(dataset: &Dataset) -> Vec<TidalRange> {
    dataset
        .records()
        .iter()
        .filter_map(|r| {
            let mhhw = r.mean_higher_high_water_m?;
            let mllw = r.mean_lower_low_water_m?;
            Some(TidalRange {
                year: r.year,
                total_m: mhhw - mllw,
                high_water_m: r.mean_lower_high_water_m.map(|mlhw| mhhw - mlhw),
                low_water_m: r.mean_higher_low_water_m.map(|mhlw| mhlw - mllw),
            })
        })
        .collect()
}

pub fn tidal_range_trend(ranges: &[TidalRange]) -> Option<LinearFit> {
    let points: Vec<(f64, f64)> = ranges.iter().map(|t| (t.year as f64, t.total_m)).collect();
    linear_fit(&points)
}

pub fn recent_records(dataset: &Dataset, since: i32) -> Vec<&Record> {
    dataset.records().iter().filter(|r| r.year >= since).collect()
}

// ---------------------------------------------------------------------------
// Decadal averages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecadeStats {
    /// First year of the decade, e.g. 1950.
    pub decade: i32,
    pub mean_m: f64,
    pub std_dev_m: f64,
    pub years: usize,
}

pub fn decade_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// Per-decade mean and sample standard deviation, ascending by decade,
/// keeping only decades with at least `min_years` records.
pub fn decadal_averages(dataset: &Dataset, min_years: usize) -> Vec<DecadeStats> {
    let records = dataset.records();
    records
        .chunk_by(|a, b| decade_of(a.year) == decade_of(b.year))
        .filter(|chunk| chunk.len() >= min_years.max(1))
        .map(|chunk| {
            let levels: Vec<f64> = chunk.iter().map(|r| r.mean_sea_level_m).collect();
            let (mean_m, std_dev_m) = mean_and_sample_std(&levels);
            DecadeStats {
                decade: decade_of(chunk[0].year),
                mean_m,
                std_dev_m,
                years: chunk.len(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn steady_rise() -> Dataset {
        // 3 mm per year from 1.30 m in 1990.
        Dataset::new((1990..=2009).map(|y| Record::new(y, 1.30 + 0.003 * (y - 1990) as f64)))
    }

    #[test]
    fn test_linear_fit_recovers_exact_line() {
        let fit = sea_level_trend(&steady_rise(), None).unwrap();
        assert!(approx(fit.slope, 0.003));
        assert!(approx(fit.value_at(1990.0), 1.30));
        assert!(approx(fit.mm_per_year(), 3.0));
        assert!(approx(fit.cm_per_decade(), 3.0));
        assert!(approx(fit.change_over_cm(71.0), 21.3));
    }

    #[test]
    fn test_linear_fit_degenerate_inputs() {
        assert!(linear_fit(&[]).is_none());
        assert!(linear_fit(&[(2000.0, 1.3)]).is_none());
        assert!(linear_fit(&[(2000.0, 1.3), (2000.0, 1.4)]).is_none());
    }

    #[test]
    fn test_trend_since_filters_records() {
        let mut records: Vec<Record> = steady_rise().records().to_vec();
        records.push(Record::new(1960, 1.90));
        let dataset = Dataset::new(records);

        let recent = sea_level_trend(&dataset, Some(1990)).unwrap();
        assert!(approx(recent.slope, 0.003));
        let all = sea_level_trend(&dataset, None).unwrap();
        assert!(all.slope < 0.003);
    }

    #[test]
    fn test_stats_use_sample_std_and_first_extreme() {
        let dataset = Dataset::new(vec![
            Record::new(2000, 1.2),
            Record::new(2001, 1.4),
            Record::new(2002, 1.4),
            Record::new(2003, 1.0),
        ]);
        let stats = SeaLevelStats::compute(&dataset).unwrap();
        assert_eq!(stats.count, 4);
        assert!(approx(stats.mean_m, 1.25));
        // deviations -0.05, 0.15, 0.15, -0.25 -> 0.11 / 3
        assert!(approx(stats.std_dev_m, (0.11f64 / 3.0).sqrt()));
        assert_eq!(stats.max_year, 2001);
        assert_eq!(stats.min_year, 2003);
        assert!(approx(stats.range_m(), 0.4));

        assert!(SeaLevelStats::compute(&Dataset::default()).is_none());
    }

    #[test]
    fn test_year_over_year_changes() {
        let dataset = Dataset::new(vec![
            Record::new(2000, 1.30),
            Record::new(2001, 1.35),
            Record::new(2003, 1.25),
        ]);
        let changes = year_over_year_changes(&dataset);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].0, 2001);
        assert!(approx(changes[0].1, 0.05));
        assert_eq!(changes[1].0, 2003);
        assert!(approx(changes[1].1, -0.10));
    }

    #[test]
    fn test_decadal_averages_skip_sparse_decades() {
        let mut records: Vec<Record> = (1954..=1959).map(|y| Record::new(y, 1.28)).collect();
        records.extend((1960..=1963).map(|y| Record::new(y, 1.30)));
        records.extend((1970..=1979).map(|y| Record::new(y, 1.32)));
        let decades = decadal_averages(&Dataset::new(records), MIN_YEARS_PER_DECADE);

        let starts: Vec<i32> = decades.iter().map(|d| d.decade).collect();
        assert_eq!(starts, vec![1950, 1970]);
        assert_eq!(decades[0].years, 6);
        assert!(approx(decades[1].mean_m, 1.32));
        assert!(approx(decades[1].std_dev_m, 0.0));
    }

    #[test]
    fn test_tidal_ranges_need_both_extremes() {
        let mut full = Record::new(2000, 1.3);
        full.mean_higher_high_water_m = Some(2.1);
        full.mean_lower_high_water_m = Some(1.7);
        full.mean_lower_low_water_m = Some(0.5);
        let mut half = Record::new(2001, 1.3);
        half.mean_higher_high_water_m = Some(2.1);

        let ranges = tidal_ranges(&Dataset::new(vec![full, half]));
        assert_eq!(ranges.len(), 1);
        assert!(approx(ranges[0].total_m, 1.6));
        assert!(approx(ranges[0].high_water_m.unwrap(), 0.4));
        assert_eq!(ranges[0].low_water_m, None);
    }

    #[test]
    fn test_recent_records() {
        let data = steady_rise();
        let recent = recent_records(&data, 2007);
        let years: Vec<i32> = recent.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2007, 2008, 2009]);
    }
}
