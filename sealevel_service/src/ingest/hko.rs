/// HKO yearly tide payload parser.
///
/// The feed URL ends in `.xml` but has been seen serving three shapes, all
/// of which are accepted:
///
/// 1. A JSON document:
///    `tide.data[]` — one block per station
///      `.code`      — station code, e.g. "QUB"
///      `.yearData[]` — rows of `[year, msl, mhhw, mlhw, mhlw, mllw]`,
///                      numbers or strings, `"***"` for a missing value
/// 2. XML records, in child-element, attribute, or comma-list form:
///    `<record><year>1954</year><msl>1.28</msl></record>`
///    `<record year="1954" msl="1.28"/>`
///    `<yearData>1954,1.28,2.01,1.62,0.93,0.55</yearData>`
/// 3. Either of the above wrapped in HTML markup, e.g. a JSON document
///    inside a `<pre>` element.
///
/// The parser only extracts tokens; typing and range checks belong to
/// `validate`.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Deserialize;
use serde_json::Value;

use crate::model::{CrawlError, RawEntry};

// ---------------------------------------------------------------------------
// Serde structures for the JSON document
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TideResponse {
    tide: TideSection,
}

#[derive(Deserialize)]
struct TideSection {
    data: Vec<StationBlock>,
}

/// Blocks without a `code` are kept out of every station's rows.
#[derive(Deserialize)]
struct StationBlock {
    #[serde(default)]
    code: Option<String>,
    #[serde(rename = "yearData", default)]
    year_data: Vec<Vec<Value>>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Parses a raw response body into the station's rows, in source order.
///
/// # Errors
/// `CrawlError::Parse` when the body is empty, is malformed beyond
/// recovery, does not mention the station, or holds no rows for it.
pub fn parse_payload(body: &str, station_code: &str) -> Result<Vec<RawEntry>, CrawlError> {
    let trimmed = body.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Err(CrawlError::Parse("empty response body".to_string()));
    }

    let entries = if looks_like_json(trimmed) {
        parse_json(trimmed, station_code)?
    } else {
        parse_markup(trimmed, station_code)?
    };

    if entries.is_empty() {
        return Err(CrawlError::Parse(format!(
            "no recognizable yearly records for station {}",
            station_code
        )));
    }

    Ok(entries)
}

fn looks_like_json(text: &str) -> bool {
    text.starts_with('{')
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn parse_json(json: &str, station_code: &str) -> Result<Vec<RawEntry>, CrawlError> {
    let response: TideResponse = serde_json::from_str(json)
        .map_err(|e| CrawlError::Parse(format!("JSON deserialization failed: {}", e)))?;

    let block = response
        .tide
        .data
        .into_iter()
        .find(|b| {
            b.code
                .as_deref()
                .is_some_and(|code| code.trim().eq_ignore_ascii_case(station_code))
        })
        .ok_or_else(|| {
            CrawlError::Parse(format!("station {} not found in payload", station_code))
        })?;

    Ok(block
        .year_data
        .iter()
        .map(|row| {
            let cells: Vec<Option<String>> = row.iter().map(cell_token).collect();
            entry_from_cells(&cells)
        })
        .collect())
}

fn cell_token(cell: &Value) -> Option<String> {
    match cell {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Builds an entry from positional cells `[year, msl, mhhw, mlhw, mhlw, mllw]`.
fn entry_from_cells(cells: &[Option<String>]) -> RawEntry {
    let cell = |idx: usize| cells.get(idx).cloned().flatten();
    RawEntry {
        year: cell(0),
        mean_sea_level: cell(1),
        mean_higher_high_water: cell(2),
        mean_lower_high_water: cell(3),
        mean_higher_low_water: cell(4),
        mean_lower_low_water: cell(5),
    }
}

// ---------------------------------------------------------------------------
// XML / HTML
// ---------------------------------------------------------------------------

/// Which `RawEntry` slot an element or attribute name feeds.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Year,
    MeanSeaLevel,
    MeanHigherHighWater,
    MeanLowerHighWater,
    MeanHigherLowWater,
    MeanLowerLowWater,
}

/// Lowercases and drops `_`, `-` so `Mean_Sea_Level_m`, `meanSeaLevel`
/// and `MSL` compare equal to their canonical spellings.
fn normalize_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_record_tag(name: &str) -> bool {
    matches!(name, "record" | "row" | "entry" | "yeardata" | "yearrecord")
}

fn field_for(name: &str) -> Option<Field> {
    match name {
        "year" | "yr" => Some(Field::Year),
        "msl" | "meansealevel" | "meansealevelm" => Some(Field::MeanSeaLevel),
        "mhhw" | "meanhigherhighwater" | "meanhigherhighwaterm" => Some(Field::MeanHigherHighWater),
        "mlhw" | "meanlowerhighwater" | "meanlowerhighwaterm" => Some(Field::MeanLowerHighWater),
        "mhlw" | "meanhigherlowwater" | "meanhigherlowwaterm" => Some(Field::MeanHigherLowWater),
        "mllw" | "meanlowerlowwater" | "meanlowerlowwaterm" => Some(Field::MeanLowerLowWater),
        _ => None,
    }
}

fn set_field(entry: &mut RawEntry, field: Field, value: String) {
    let slot = match field {
        Field::Year => &mut entry.year,
        Field::MeanSeaLevel => &mut entry.mean_sea_level,
        Field::MeanHigherHighWater => &mut entry.mean_higher_high_water,
        Field::MeanLowerHighWater => &mut entry.mean_lower_high_water,
        Field::MeanHigherLowWater => &mut entry.mean_higher_low_water,
        Field::MeanLowerLowWater => &mut entry.mean_lower_low_water,
    };
    *slot = Some(value);
}

/// Row under construction, plus the text seen directly inside it.
struct OpenRecord {
    /// Position of the record element in the open-element stack.
    level: usize,
    entry: RawEntry,
    has_fields: bool,
    own_text: String,
}

impl OpenRecord {
    fn finish(self) -> Option<RawEntry> {
        if self.has_fields {
            return Some(self.entry);
        }
        // `<yearData>1954,1.28,...</yearData>`
        let text = self.own_text.trim();
        if text.is_empty() {
            return None;
        }
        let cells: Vec<Option<String>> = text
            .split(',')
            .map(|c| Some(c.trim().to_string()).filter(|c| !c.is_empty()))
            .collect();
        Some(entry_from_cells(&cells))
    }
}

/// Open elements, innermost last.
///
/// HTML void elements (`<br>`, `<meta>`) open without ever closing, so an
/// end tag closes the nearest open element with its name together with
/// everything opened after it. End tags matching nothing open are ignored.
#[derive(Default)]
struct OpenElements {
    names: Vec<String>,
}

impl OpenElements {
    /// Pushes `name` and returns its position.
    fn open(&mut self, name: String) -> usize {
        self.names.push(name);
        self.names.len() - 1
    }

    /// Closes the nearest open `name`, returning its position.
    fn close(&mut self, name: &str) -> Option<usize> {
        let pos = self.names.iter().rposition(|n| n == name)?;
        self.names.truncate(pos);
        Some(pos)
    }
}

fn station_attribute(e: &BytesStart<'_>) -> Option<String> {
    e.html_attributes().flatten().find_map(|attr| {
        let key = normalize_name(attr.key.local_name().as_ref());
        if key == "code" || key == "station" || key == "stn" {
            attr.unescape_value().ok().map(|v| v.trim().to_string())
        } else {
            None
        }
    })
}

fn apply_attributes(e: &BytesStart<'_>, record: &mut OpenRecord) {
    for attr in e.html_attributes().flatten() {
        let key = normalize_name(attr.key.local_name().as_ref());
        if let Some(field) = field_for(&key) {
            if let Ok(value) = attr.unescape_value() {
                set_field(&mut record.entry, field, value.trim().to_string());
                record.has_fields = true;
            }
        }
    }
}

fn parse_markup(markup: &str, station_code: &str) -> Result<Vec<RawEntry>, CrawlError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut entries = Vec::new();
    let mut embedded_json: Option<Result<Vec<RawEntry>, CrawlError>> = None;
    let mut open = OpenElements::default();
    // Position of an element scoped to another station; everything inside it is skipped.
    let mut excluded: Option<usize> = None;
    let mut record: Option<OpenRecord> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = normalize_name(e.local_name().as_ref());
                let level = open.open(name.clone());
                if excluded.is_some() {
                    continue;
                }
                if let Some(code) = station_attribute(&e) {
                    if !code.eq_ignore_ascii_case(station_code) {
                        excluded = Some(level);
                        continue;
                    }
                }
                if is_record_tag(&name) && record.is_none() {
                    let mut row = OpenRecord {
                        level,
                        entry: RawEntry::default(),
                        has_fields: false,
                        own_text: String::new(),
                    };
                    apply_attributes(&e, &mut row);
                    record = Some(row);
                } else if record.is_some() {
                    field = field_for(&name);
                }
            }
            Ok(Event::Empty(e)) => {
                if excluded.is_some() {
                    continue;
                }
                let name = normalize_name(e.local_name().as_ref());
                if is_record_tag(&name) && record.is_none() {
                    if let Some(code) = station_attribute(&e) {
                        if !code.eq_ignore_ascii_case(station_code) {
                            continue;
                        }
                    }
                    let mut row = OpenRecord {
                        level: 0,
                        entry: RawEntry::default(),
                        has_fields: false,
                        own_text: String::new(),
                    };
                    apply_attributes(&e, &mut row);
                    if let Some(entry) = row.finish() {
                        entries.push(entry);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = normalize_name(e.local_name().as_ref());
                field = None;
                let Some(pos) = open.close(&name) else {
                    continue;
                };
                if excluded.is_some_and(|level| level >= pos) {
                    excluded = None;
                }
                if record.as_ref().is_some_and(|r| r.level >= pos) {
                    if let Some(entry) = record.take().and_then(OpenRecord::finish) {
                        entries.push(entry);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if excluded.is_some() {
                    continue;
                }
                let text = match t.unescape() {
                    Ok(cow) => cow.into_owned(),
                    Err(_) => String::from_utf8_lossy(&t).into_owned(),
                };
                handle_text(&text, &mut record, field, &mut embedded_json, station_code);
            }
            Ok(Event::CData(c)) => {
                if excluded.is_some() {
                    continue;
                }
                let text = String::from_utf8_lossy(&c).into_owned();
                handle_text(&text, &mut record, field, &mut embedded_json, station_code);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                // Tolerate trailing junk after usable rows.
                if entries.is_empty() && embedded_json.is_none() {
                    return Err(CrawlError::Parse(format!(
                        "XML parse error at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                break;
            }
            _ => {}
        }
    }

    if entries.is_empty() {
        if let Some(json_result) = embedded_json {
            return json_result;
        }
    }

    Ok(entries)
}

fn handle_text(
    text: &str,
    record: &mut Option<OpenRecord>,
    field: Option<Field>,
    embedded_json: &mut Option<Result<Vec<RawEntry>, CrawlError>>,
    station_code: &str,
) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match (record.as_mut(), field) {
        (Some(open), Some(field)) => {
            set_field(&mut open.entry, field, text.to_string());
            open.has_fields = true;
        }
        (Some(open), None) => open.own_text.push_str(text),
        (None, _) => {
            // A JSON document wrapped in HTML, e.g. inside <pre>.
            let keep_looking = !matches!(embedded_json, Some(Ok(found)) if !found.is_empty());
            if keep_looking && looks_like_json(text) {
                *embedded_json = Some(parse_json(text, station_code));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;

    // --- JSON ---------------------------------------------------------------

    #[test]
    fn test_parse_json_selects_requested_station() {
        let entries = parse_payload(fixture_hko_json(), "QUB").expect("fixture should parse");
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].year.as_deref(), Some("1954"));
        assert_eq!(entries[0].mean_sea_level.as_deref(), Some("1.28"));
        assert_eq!(entries[0].mean_higher_high_water.as_deref(), Some("2.01"));
        assert_eq!(entries[0].mean_lower_low_water.as_deref(), Some("0.55"));
    }

    #[test]
    fn test_parse_json_keeps_placeholder_tokens_for_validator() {
        let entries = parse_payload(fixture_hko_json(), "QUB").unwrap();
        let missing = entries
            .iter()
            .find(|e| e.year.as_deref() == Some("1955"))
            .expect("1955 row should be present");
        assert_eq!(missing.mean_sea_level.as_deref(), Some("***"));
    }

    #[test]
    fn test_parse_json_numeric_cells() {
        let entries = parse_payload(fixture_hko_json(), "QUB").unwrap();
        let numeric = entries.last().unwrap();
        assert_eq!(numeric.year.as_deref(), Some("2024"));
        assert_eq!(numeric.mean_sea_level.as_deref(), Some("1.51"));
        assert_eq!(numeric.mean_higher_high_water, None, "short rows leave components empty");
    }

    #[test]
    fn test_parse_json_other_station_only() {
        let result = parse_payload(fixture_hko_json(), "TBT");
        let entries = result.expect("Tsim Bei Tsui block exists");
        assert_eq!(entries.len(), 1);

        let result = parse_payload(fixture_hko_json(), "XYZ");
        assert!(matches!(result, Err(CrawlError::Parse(msg)) if msg.contains("XYZ")));
    }

    #[test]
    fn test_parse_json_station_without_rows_is_parse_error() {
        let json = r#"{ "tide": { "data": [ { "code": "QUB", "yearData": [] } ] } }"#;
        assert!(matches!(parse_payload(json, "QUB"), Err(CrawlError::Parse(_))));
    }

    #[test]
    fn test_parse_json_block_without_code_is_skipped() {
        let entries = parse_payload(fixture_json_block_without_code(), "QUB")
            .expect("QUB rows must survive an unrelated block without a code");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].year.as_deref(), Some("1954"));
        assert_eq!(entries[0].mean_sea_level.as_deref(), Some("1.28"));
    }

    #[test]
    fn test_parse_malformed_json_is_parse_error() {
        let result = parse_payload("{ this is not valid json }}}", "QUB");
        assert!(matches!(result, Err(CrawlError::Parse(_))));
    }

    // --- XML ----------------------------------------------------------------

    #[test]
    fn test_parse_xml_child_elements() {
        let entries = parse_payload(fixture_records_xml(), "QUB").expect("xml should parse");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], RawEntry {
            year: Some("1955".to_string()),
            mean_sea_level: Some("1.29".to_string()),
            mean_higher_high_water: Some("2.02".to_string()),
            mean_lower_high_water: None,
            mean_higher_low_water: None,
            mean_lower_low_water: Some("0.56".to_string()),
        });
    }

    #[test]
    fn test_parse_xml_skips_other_station_blocks() {
        let entries = parse_payload(fixture_records_xml(), "QUB").unwrap();
        assert!(
            entries.iter().all(|e| e.year.as_deref() != Some("1999")),
            "rows inside the TBT block must not leak into QUB"
        );
    }

    #[test]
    fn test_parse_xml_attribute_and_list_forms() {
        let entries = parse_payload(fixture_mixed_forms_xml(), "QUB").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].year.as_deref(), Some("1960"));
        assert_eq!(entries[0].mean_sea_level.as_deref(), Some("1.31"));
        assert_eq!(entries[1].year.as_deref(), Some("1961"));
        assert_eq!(entries[1].mean_higher_high_water.as_deref(), Some("2.05"));
        assert_eq!(entries[2].mean_sea_level.as_deref(), Some("***"));
    }

    #[test]
    fn test_parse_html_wrapped_xml() {
        let entries = parse_payload(fixture_html_wrapped_xml(), "QUB").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].year.as_deref(), Some("2024"));
        assert_eq!(entries[1].mean_sea_level.as_deref(), Some("1.510"));
    }

    #[test]
    fn test_parse_void_elements_inside_foreign_station_block() {
        let entries = parse_payload(fixture_void_elements_in_foreign_block(), "QUB")
            .expect("QUB rows after an unclosed <br> in another station's block");
        let years: Vec<&str> = entries.iter().filter_map(|e| e.year.as_deref()).collect();
        assert_eq!(years, vec!["1954", "1955"]);
        assert_eq!(entries[1].mean_sea_level.as_deref(), Some("1.29"));
    }

    #[test]
    fn test_parse_void_elements_inside_record() {
        let html = "<div><record><year>1954</year><br><msl>1.28</msl></record>\
                    <record><year>1955</year><msl>1.29</msl></record></div>";
        let entries = parse_payload(html, "QUB").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].mean_sea_level.as_deref(), Some("1.28"));
    }

    #[test]
    fn test_parse_html_wrapped_json() {
        let entries = parse_payload(fixture_html_wrapped_json(), "QUB").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].year.as_deref(), Some("1954"));
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_bom() {
        let body = format!("\u{feff}\n\n   {}\n  ", fixture_records_xml());
        assert_eq!(parse_payload(&body, "QUB").unwrap().len(), 3);
    }

    #[test]
    fn test_parse_html_without_records_is_parse_error() {
        let html = "<html><body><h1>Service temporarily unavailable</h1></body></html>";
        let result = parse_payload(html, "QUB");
        assert!(matches!(result, Err(CrawlError::Parse(_))), "got {:?}", result);
    }

    #[test]
    fn test_parse_empty_string_is_parse_error() {
        assert!(matches!(parse_payload("", "QUB"), Err(CrawlError::Parse(_))));
        assert!(matches!(parse_payload("  \n ", "QUB"), Err(CrawlError::Parse(_))));
    }

    #[test]
    fn test_name_normalization() {
        assert_eq!(normalize_name(b"Mean_Sea_Level_m"), "meansealevelm");
        assert_eq!(field_for(&normalize_name(b"MSL")), Some(Field::MeanSeaLevel));
        assert_eq!(field_for(&normalize_name(b"mean-lower-low-water")), Some(Field::MeanLowerLowWater));
        assert!(is_record_tag(&normalize_name(b"yearData")));
    }
}
