//! CSV row ingestion.
//!
//! Exports from different monitoring networks disagree on header names and
//! casing (`Latitude` vs `lat`, `Amount` vs `PollutantAmount`). Each
//! logical column is resolved through an ordered list of accepted names,
//! compared case-insensitively; the first one present wins.

use envrisk_pollution_models::RawReading;
use serde::Serialize;

use crate::PollutionError;

pub const YEAR_HEADERS: &[&str] = &["year"];
pub const MONTH_HEADERS: &[&str] = &["month"];
pub const LATITUDE_HEADERS: &[&str] = &["latitude", "lat"];
pub const LONGITUDE_HEADERS: &[&str] = &["longitude", "lon", "lng"];
pub const AMOUNT_HEADERS: &[&str] = &["amount", "value", "pollutantamount"];

/// Row counts from one ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub rows_read: u64,
    pub rows_dropped: u64,
}

/// Column positions resolved from a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    year: usize,
    month: usize,
    latitude: usize,
    longitude: usize,
    amount: usize,
}

/// Parses CSV text with a header row into readings.
///
/// Rows with an unparseable or out-of-range field are skipped with a
/// warning and counted in [`IngestReport::rows_dropped`].
///
/// # Errors
///
/// * [`PollutionError::Csv`] if the header row cannot be read
/// * [`PollutionError::MissingColumn`] if a required column is absent
pub fn read_readings<R: std::io::Read>(
    reader: R,
) -> Result<(Vec<RawReading>, IngestReport), PollutionError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
        .collect();
    let columns = resolve_columns(&headers)?;

    let mut readings = Vec::new();
    let mut report = IngestReport::default();

    for (i, result) in reader.records().enumerate() {
        report.rows_read += 1;
        // Header is line 1.
        let line = i + 2;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping unreadable CSV row at line {line}: {e}");
                report.rows_dropped += 1;
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Some(reading) => readings.push(reading),
            None => {
                log::warn!("Skipping malformed reading at line {line}: {record:?}");
                report.rows_dropped += 1;
            }
        }
    }

    if report.rows_dropped > 0 {
        log::warn!(
            "Dropped {} of {} rows during ingestion",
            report.rows_dropped,
            report.rows_read
        );
    }

    Ok((readings, report))
}

fn resolve_columns(headers: &[String]) -> Result<Columns, PollutionError> {
    Ok(Columns {
        year: find_column(headers, "year", YEAR_HEADERS)?,
        month: find_column(headers, "month", MONTH_HEADERS)?,
        latitude: find_column(headers, "latitude", LATITUDE_HEADERS)?,
        longitude: find_column(headers, "longitude", LONGITUDE_HEADERS)?,
        amount: find_column(headers, "amount", AMOUNT_HEADERS)?,
    })
}

/// Index of the first candidate name present in `headers`.
fn find_column(
    headers: &[String],
    field: &'static str,
    candidates: &[&str],
) -> Result<usize, PollutionError> {
    candidates
        .iter()
        .find_map(|candidate| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(candidate))
        })
        .ok_or_else(|| PollutionError::MissingColumn {
            field,
            candidates: candidates.join(", "),
        })
}

fn parse_row(record: &csv::StringRecord, columns: &Columns) -> Option<RawReading> {
    let reading = RawReading {
        year: parse_integer(record.get(columns.year)?)?,
        month: parse_integer(record.get(columns.month)?)?,
        latitude: parse_float(record.get(columns.latitude)?)?,
        longitude: parse_float(record.get(columns.longitude)?)?,
        amount: parse_float(record.get(columns.amount)?)?,
    };
    reading.is_valid().then_some(reading)
}

fn parse_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts plain integers and integral floats (`"2024"`, `"2024.0"`).
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn parse_integer<T: TryFrom<i64>>(s: &str) -> Option<T> {
    let value = match s.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = parse_float(s)?;
            if f.fract() != 0.0 || f.abs() > 1e15 {
                return None;
            }
            f as i64
        }
    };
    T::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_canonical_headers() {
        let csv = "Year,Month,Latitude,Longitude,Amount\n2024,1,47.6,-122.3,0.25\n";
        let (readings, report) = read_readings(csv.as_bytes()).unwrap();
        assert_eq!(report, IngestReport { rows_read: 1, rows_dropped: 0 });
        assert_eq!(
            readings,
            vec![RawReading {
                year: 2024,
                month: 1,
                latitude: 47.6,
                longitude: -122.3,
                amount: 0.25,
            }]
        );
    }

    #[test]
    fn resolves_alternate_headers_case_insensitively() {
        let csv = "MONTH,lon,YEAR,Lat,PollutantAmount\n3,-122.3,2023,47.6,12\n";
        let (readings, _) = read_readings(csv.as_bytes()).unwrap();
        assert_eq!(readings[0].month, 3);
        assert_eq!(readings[0].year, 2023);
        assert!((readings[0].longitude + 122.3).abs() < 1e-12);
        assert!((readings[0].amount - 12.0).abs() < 1e-12);
    }

    #[test]
    fn earlier_candidates_win() {
        let csv = "year,month,lat,latitude,lon,amount\n2024,1,1.0,2.0,3.0,4.0\n";
        let (readings, _) = read_readings(csv.as_bytes()).unwrap();
        assert!((readings[0].latitude - 2.0).abs() < 1e-12);
    }

    #[test]
    fn strips_byte_order_mark() {
        let csv = "\u{feff}Year,Month,Lat,Lon,Value\n2024,2,1,1,5\n";
        let (readings, _) = read_readings(csv.as_bytes()).unwrap();
        assert_eq!(readings.len(), 1);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "Year,Month,Latitude,Amount\n2024,1,47.6,1\n";
        let err = read_readings(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            PollutionError::MissingColumn {
                field: "longitude",
                ..
            }
        ));
    }

    #[test]
    fn malformed_rows_are_dropped_not_fatal() {
        let csv = "\
Year,Month,Lat,Lon,Amount
2024,1,47.6,-122.3,1.0
abc,1,47.6,-122.3,1.0
2024,13,47.6,-122.3,1.0
2024,2,,-122.3,1.0
2024,2,47.6,-122.3,NaN
2024.0,2.0,47.6,-122.3,2.0
2024,2.5,47.6,-122.3,2.0
";
        let (readings, report) = read_readings(csv.as_bytes()).unwrap();
        assert_eq!(report.rows_read, 7);
        assert_eq!(report.rows_dropped, 5);
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].month, 2);
    }

    #[test]
    fn skips_blank_lines() {
        let csv = "Year,Month,Lat,Lon,Amount\n\n2024,1,1,1,1\n\n";
        let (readings, report) = read_readings(csv.as_bytes()).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(report.rows_dropped, 0);
    }
}
