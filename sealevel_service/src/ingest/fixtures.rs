/// Test fixtures: representative payloads from the HKO yearly tide feed.
///
/// These fixtures are structurally complete but truncated to the minimum
/// needed to exercise the parser. The JSON one mirrors what
///   https://www.hko.gov.hk/cis/aws/tide/yearly_TIDE.xml
/// actually serves:
///
///   tide.data[]
///     .code        — station code (string)
///     .yearData[]  — [year, msl, mhhw, mlhw, mhlw, mllw]
///
/// Note: cells are usually strings, `"***"` marks a missing value, and some
/// rows are shorter than six cells. Parsers must handle all three.

/// Quarry Bay plus a second station. QUB has a placeholder row (1955) and
/// a numeric, short row (2024).
#[cfg(test)]
pub(crate) fn fixture_hko_json() -> &'static str {
    r#"{
      "tide": {
        "title": "Yearly tidal information",
        "data": [
          {
            "code": "TBT",
            "name": "Tsim Bei Tsui",
            "yearData": [
              ["1999", "1.41", "2.40", "1.95", "1.02", "0.48"]
            ]
          },
          {
            "code": "QUB",
            "name": "Quarry Bay",
            "yearData": [
              ["1954", "1.28", "2.01", "1.62", "0.93", "0.55"],
              ["1955", "***", "***", "***", "***", "***"],
              ["1956", "1.30", "2.03", "1.64", "0.95", "0.57"],
              [2024, 1.51]
            ]
          }
        ]
      }
    }"#
}

/// Child-element XML with a foreign station block that must be skipped.
#[cfg(test)]
pub(crate) fn fixture_records_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
    <tide>
      <station code="TBT">
        <record><year>1999</year><msl>1.41</msl></record>
      </station>
      <station code="QUB">
        <record><year>1954</year><msl>1.28</msl><mhhw>2.01</mhhw><mllw>0.55</mllw></record>
        <record>
          <Year> 1955 </Year>
          <Mean_Sea_Level_m>1.29</Mean_Sea_Level_m>
          <Mean_Higher_High_Water_m>2.02</Mean_Higher_High_Water_m>
          <Mean_Lower_Low_Water_m>0.56</Mean_Lower_Low_Water_m>
        </record>
        <record><year>1956</year><msl>1.30</msl></record>
      </station>
    </tide>"#
}

/// A station block with no `code` ahead of the QUB block.
#[cfg(test)]
pub(crate) fn fixture_json_block_without_code() -> &'static str {
    r#"{"tide":{"data":[{"name":"no code"},{"code":"QUB","yearData":[["1954","1.28"]]}]}}"#
}

/// Attribute form, comma-list form, and a placeholder value.
#[cfg(test)]
pub(crate) fn fixture_mixed_forms_xml() -> &'static str {
    r#"<tide>
      <record year="1960" msl="1.31"/>
      <yearData>1961,1.32,2.05,1.66,0.97,0.58</yearData>
      <yearData>1962,***,***,***,***,***</yearData>
    </tide>"#
}

/// Records inside an HTML page with void elements and entities.
#[cfg(test)]
pub(crate) fn fixture_html_wrapped_xml() -> &'static str {
    r#"<!DOCTYPE html>
    <html>
      <head><meta charset="utf-8"><title>Yearly Tide &amp; Sea Level</title></head>
      <body>
        <p>Quarry Bay&nbsp;(QUB)<br></p>
        <div id="data">
          <record><year>1954</year><msl>1.280</msl></record>
          <record><year>2024</year><msl>1.510</msl></record>
        </div>
      </body>
    </html>"#
}

/// The JSON document inside a <pre> element.
#[cfg(test)]
pub(crate) fn fixture_html_wrapped_json() -> &'static str {
    r#"<html><body><pre>{ "tide": { "data": [ { "code": "QUB", "yearData": [ ["1954", "1.280"], ["1955", "1.290"] ] } ] } }</pre></body></html>"#
}

/// Another station's block containing unclosed HTML void elements,
/// followed by the QUB block.
#[cfg(test)]
pub(crate) fn fixture_void_elements_in_foreign_block() -> &'static str {
    r#"<html><head><meta charset="utf-8"></head><body>
      <div code="TBT">
        <p>Tsim Bei Tsui<br></p>
        <record><year>1999</year><msl>1.41</msl></record>
      </div>
      <div code="QUB">
        <p>Quarry Bay<br></p>
        <record><year>1954</year><msl>1.28</msl></record>
        <record><year>1955</year><msl>1.29</msl></record>
      </div>
    </body></html>"#
}
