/// Station registry for the sea level crawler.
///
/// Defines the tide gauge this service crawls, along with the descriptive
/// metadata copied into every metadata file. This is the single source of
/// truth for the station code; other modules look stations up here rather
/// than hardcoding codes.

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata for a single HKO tide gauge station.
#[derive(Debug)]
pub struct Station {
    /// Short HKO station code, e.g. `"QUB"`.
    pub code: &'static str,
    /// Official station name.
    pub name: &'static str,
    /// Publishing agency.
    pub source: &'static str,
    /// Human-facing page for the station's yearly tide table.
    pub page_url: &'static str,
    /// Vertical datum of every published level.
    pub units: &'static str,
    /// Caveats published alongside the data.
    pub note: &'static str,
    /// First year of the station's operating record.
    pub first_year: i32,
}

/// Quarry Bay. Records from 1954 to 1985 come from the North Point gauge.
pub static QUARRY_BAY: Station = Station {
    code: "QUB",
    name: "Quarry Bay",
    source: "Hong Kong Observatory (HKO)",
    page_url: "https://www.hko.gov.hk/en/cis/yearlyTide.htm?stn=QUB",
    units: "meters above Chart Datum",
    note: "Tidal information from 1954 to 1985 are based on North Point tide gauge data. \
           Mean Sea Levels are computed directly from on-site measurement data without \
           any post data corrections including land settlement.",
    first_year: 1954,
};

/// All stations this deployment knows about.
pub static STATION_REGISTRY: &[&Station] = &[&QUARRY_BAY];

/// Looks up a station by code, ignoring ASCII case.
pub fn find_station(code: &str) -> Option<&'static Station> {
    STATION_REGISTRY
        .iter()
        .copied()
        .find(|s| s.code.eq_ignore_ascii_case(code.trim()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_codes_are_short_uppercase() {
        for station in STATION_REGISTRY {
            assert_eq!(station.code.len(), 3, "{} code should be 3 letters", station.name);
            assert!(station.code.chars().all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_find_station_is_case_insensitive() {
        let station = find_station("qub").expect("Quarry Bay should be registered");
        assert_eq!(station.name, "Quarry Bay");
        assert!(find_station(" QUB ").is_some());
        assert!(find_station("XYZ").is_none());
    }

    #[test]
    fn test_page_url_names_station() {
        assert!(QUARRY_BAY.page_url.ends_with("stn=QUB"));
        assert_eq!(QUARRY_BAY.first_year, 1954);
    }
}
