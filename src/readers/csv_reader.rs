use crate::error::{LoadError, Result};
use crate::models::{AirQualityRecord, Column, Dataset};
use crate::readers::archive_reader::ArchiveReader;
use crate::utils::constants::{
    DATE_FORMAT, DATE_TIME_COLUMN, DEFAULT_BUFFER_SIZE, MISSING_MARKERS, MMAP_THRESHOLD_BYTES,
    OFFSET_TIMESTAMP_FORMATS, TIMESTAMP_FORMATS, WEATHER_COLUMN,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use memmap2::Mmap;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Loads the air-quality CSV into a [`Dataset`].
#[derive(Debug, Clone)]
pub struct DatasetReader {
    use_mmap: Option<bool>,
    strict: bool,
}

/// Positions of the known columns within a CSV header row.
#[derive(Debug)]
struct HeaderMap {
    date_time: usize,
    columns: Vec<(Column, usize)>,
    weather: Option<usize>,
}

impl DatasetReader {
    pub fn new() -> Self {
        Self {
            use_mmap: None,
            strict: false,
        }
    }

    /// Force memory-mapped (`true`) or buffered (`false`) reads. By default
    /// files above [`MMAP_THRESHOLD_BYTES`] are mapped.
    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = Some(use_mmap);
        self
    }

    /// Reject rows with negative pollutant concentrations instead of
    /// counting and keeping them.
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Read a dataset from a `.csv` file or a `.zip` archive of CSV files.
    pub fn read_dataset(&self, path: &Path) -> Result<Dataset> {
        if !path.exists() {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("zip"));

        let dataset = if is_zip {
            ArchiveReader::new(self.clone()).read_archive(path)?
        } else {
            let bytes = self.read_bytes(path)?;
            self.parse_bytes(&bytes, path)?
        };

        info!(
            path = %path.display(),
            records = dataset.len(),
            weather_column = dataset.has_weather_column(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    fn read_bytes(&self, path: &Path) -> Result<FileBytes> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let use_mmap = self.use_mmap.unwrap_or(size >= MMAP_THRESHOLD_BYTES);

        if use_mmap && size > 0 {
            debug!(size, "memory-mapping input");
            let mmap = unsafe { Mmap::map(&file)? };
            Ok(FileBytes::Mapped(mmap))
        } else {
            let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
            let mut buffer = Vec::with_capacity(size as usize);
            reader.read_to_end(&mut buffer)?;
            Ok(FileBytes::Buffered(buffer))
        }
    }

    /// Parse raw CSV bytes, detecting a BOM and falling back to Windows-1252
    /// for input that is not valid UTF-8.
    pub fn parse_bytes(&self, bytes: &[u8], source: &Path) -> Result<Dataset> {
        let text = decode_text(bytes);
        self.parse_str(&text, source)
    }

    pub fn parse_str(&self, text: &str, source: &Path) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let malformed = |e: csv::Error| LoadError::Malformed {
            path: source.to_path_buf(),
            source: e,
        };

        let header = HeaderMap::from_headers(reader.headers().map_err(malformed)?, source)?;
        let mut records = Vec::new();
        let mut out_of_range = 0usize;

        for (index, row) in reader.records().enumerate() {
            let row = row.map_err(malformed)?;
            // Row numbers as a spreadsheet shows them: header is row 1
            let line = index + 2;

            let record = header.parse_row(&row, line)?;
            if let Err(e) = record.validate_row(line) {
                if self.strict {
                    return Err(e);
                }
                out_of_range += 1;
            }
            records.push(record);
        }

        if out_of_range > 0 {
            warn!(
                rows = out_of_range,
                "rows with negative pollutant concentrations kept as-is"
            );
        }

        let columns: BTreeSet<Column> = header.columns.iter().map(|(c, _)| *c).collect();
        Ok(Dataset::new(records, columns, header.weather.is_some()))
    }
}

impl Default for DatasetReader {
    fn default() -> Self {
        Self::new()
    }
}

enum FileBytes {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileBytes::Mapped(m) => &m[..],
            FileBytes::Buffered(b) => &b[..],
        }
    }
}

impl HeaderMap {
    fn from_headers(headers: &csv::StringRecord, source: &Path) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let date_time = position(DATE_TIME_COLUMN).ok_or_else(|| LoadError::MissingColumn {
            column: DATE_TIME_COLUMN.to_string(),
            path: source.to_path_buf(),
        })?;

        let mut columns = Vec::new();
        for column in Column::ALL {
            match position(column.header()) {
                Some(idx) => columns.push((column, idx)),
                None if column.is_required() => {
                    return Err(LoadError::MissingColumn {
                        column: column.header().to_string(),
                        path: source.to_path_buf(),
                    }
                    .into())
                }
                None => debug!(column = column.header(), "optional column absent"),
            }
        }

        Ok(Self {
            date_time,
            columns,
            weather: position(WEATHER_COLUMN),
        })
    }

    fn parse_row(&self, row: &csv::StringRecord, line: usize) -> Result<AirQualityRecord> {
        let raw_time = row.get(self.date_time).unwrap_or("");
        let date_time = parse_timestamp(raw_time).ok_or_else(|| LoadError::InvalidValue {
            row: line,
            column: DATE_TIME_COLUMN.to_string(),
            value: raw_time.to_string(),
        })?;

        let mut record = AirQualityRecord::new(date_time);
        for (column, idx) in &self.columns {
            let value = parse_optional_f64(row.get(*idx), line, column.header())?;
            record.set_value(*column, value);
        }

        if let Some(idx) = self.weather {
            record.weathersit = parse_weather_code(row.get(idx), line)?;
        }

        Ok(record)
    }
}

fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (encoding, bom_len) = Encoding::for_bom(bytes).unwrap_or((UTF_8, 0));
    let body = &bytes[bom_len..];

    if encoding == UTF_8 {
        if let Ok(text) = std::str::from_utf8(body) {
            return Cow::Borrowed(text);
        }
        warn!("input is not valid UTF-8, decoding as Windows-1252");
        let (text, _) = WINDOWS_1252.decode_without_bom_handling(body);
        return text;
    }

    let (text, _) = encoding.decode_without_bom_handling(body);
    text
}

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

/// Parse an ISO-8601 style timestamp. A bare date means midnight. A `Z` or
/// `+HH:MM` suffix is dropped and the wall-clock time kept as written.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .or_else(|| {
                    OFFSET_TIMESTAMP_FORMATS
                        .iter()
                        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
                })
                .map(|dt| dt.naive_local())
        })
}

fn parse_optional_f64(cell: Option<&str>, line: usize, column: &str) -> Result<Option<f64>> {
    let cell = cell.unwrap_or("");
    if is_missing(cell) {
        return Ok(None);
    }

    let value = cell.parse::<f64>().map_err(|_| LoadError::InvalidValue {
        row: line,
        column: column.to_string(),
        value: cell.to_string(),
    })?;

    // "inf" parses as a float but is not a measurement
    Ok(value.is_finite().then_some(value))
}

// Written as "2.0" when the column had gaps before export
fn parse_weather_code(cell: Option<&str>, line: usize) -> Result<Option<u8>> {
    let Some(value) = parse_optional_f64(cell, line, WEATHER_COLUMN)? else {
        return Ok(None);
    };

    if value.fract() != 0.0 || !(0.0..=u8::MAX as f64).contains(&value) {
        return Err(LoadError::InvalidValue {
            row: line,
            column: WEATHER_COLUMN.to_string(),
            value: value.to_string(),
        }
        .into());
    }

    Ok(Some(value as u8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
No,date_time,PM2.5,PM10,SO2,NO2,CO,O3,TEMP,RAIN,WSPM,station,weathersit
1,2013-03-01 00:00:00,4.0,4.0,4.0,7.0,300.0,77.0,-0.7,0.0,4.4,Aotizhongxin,1
2,2013-03-01 01:00:00,8.0,8.0,,7.0,300.0,77.0,-1.1,0.0,4.7,Aotizhongxin,2.0
3,2013-03-01 02:00:00,NA,7.0,5.0,10.0,300.0,73.0,-1.1,0.3,5.6,Aotizhongxin,3
";

    fn source() -> PathBuf {
        PathBuf::from("sample.csv")
    }

    #[test]
    fn test_parse_sample() {
        let dataset = DatasetReader::new().parse_str(SAMPLE, &source()).unwrap();

        assert_eq!(dataset.len(), 3);
        assert!(dataset.has_weather_column());
        assert!(dataset.has_column(Column::Rain));

        let records = dataset.records();
        assert_eq!(records[0].pm25, Some(4.0));
        assert_eq!(records[1].so2, None);
        assert_eq!(records[1].weathersit, Some(2));
        assert_eq!(records[2].pm25, None);
        assert_eq!(records[2].rain, Some(0.3));
        assert_eq!(
            records[2].date_time,
            parse_timestamp("2013-03-01T02:00:00").unwrap()
        );
    }

    #[test]
    fn test_optional_columns_absent() {
        let text = "date_time,PM2.5,NO2,CO\n2014-01-01,10,20,300\n";
        let dataset = DatasetReader::new().parse_str(text, &source()).unwrap();

        assert!(!dataset.has_weather_column());
        assert!(!dataset.has_column(Column::O3));
        assert_eq!(dataset.records()[0].weathersit, None);
    }

    #[test]
    fn test_missing_required_column() {
        let text = "date_time,PM2.5,NO2\n2014-01-01,10,20\n";
        let err = DatasetReader::new().parse_str(text, &source()).unwrap_err();

        match err {
            ReportError::Load(LoadError::MissingColumn { column, .. }) => assert_eq!(column, "CO"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_number_names_row() {
        let text = "date_time,PM2.5,NO2,CO\n2014-01-01,10,20,300\n2014-01-02,abc,20,300\n";
        let err = DatasetReader::new().parse_str(text, &source()).unwrap_err();

        match err {
            ReportError::Load(LoadError::InvalidValue { row, column, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "PM2.5");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_validation() {
        let text = "date_time,PM2.5,NO2,CO\n2014-01-01,-5,20,300\n";

        let lenient = DatasetReader::new().parse_str(text, &source()).unwrap();
        assert_eq!(lenient.len(), 1);

        let strict = DatasetReader::new()
            .with_strict_validation(true)
            .parse_str(text, &source());
        assert!(strict.is_err());
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2017-02-28 23:00:00").is_some());
        assert!(parse_timestamp("2017-02-28T23:00:00.000").is_some());
        assert!(parse_timestamp("2017-02-28 23:00").is_some());
        assert_eq!(
            parse_timestamp("2017-02-28"),
            parse_timestamp("2017-02-28 00:00:00")
        );
        assert!(parse_timestamp("28/02/2017").is_none());
    }

    #[test]
    fn test_timestamp_offsets_keep_wall_clock() {
        let expected = parse_timestamp("2013-03-01 08:00:00");

        assert_eq!(parse_timestamp("2013-03-01T08:00:00Z"), expected);
        assert_eq!(parse_timestamp("2013-03-01T08:00:00+08:00"), expected);
        assert_eq!(parse_timestamp("2013-03-01 08:00:00+08:00"), expected);
        assert_eq!(parse_timestamp("2013-03-01 08:00:00.000-05:00"), expected);

        let text = "\
date_time,PM2.5,NO2,CO
2013-03-01T00:00:00Z,10,20,300
2013-03-01T01:00:00+08:00,11,21,301
";
        let dataset = DatasetReader::new().parse_str(text, &source()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.records()[1].date_time,
            parse_timestamp("2013-03-01 01:00:00").unwrap()
        );
    }

    #[test]
    fn test_infinite_values_are_missing() {
        let text = "date_time,PM2.5,NO2,CO\n2014-01-01,inf,-inf,300\n";
        let dataset = DatasetReader::new().parse_str(text, &source()).unwrap();

        assert_eq!(dataset.records()[0].pm25, None);
        assert_eq!(dataset.records()[0].no2, None);
        assert_eq!(dataset.records()[0].co, Some(300.0));
    }

    #[test]
    fn test_ragged_row_is_load_error() {
        let text = "\
date_time,PM2.5,NO2,CO
2014-01-01,10,20,300
2014-01-02,10,20,300,7,8
";
        let err = DatasetReader::new().parse_str(text, &source()).unwrap_err();

        assert!(err.is_load_error());
        assert!(matches!(
            err,
            ReportError::Load(LoadError::Malformed { .. })
        ));
    }

    #[test]
    fn test_bom_and_latin1() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"date_time,PM2.5,NO2,CO\n2014-01-01,1,2,3\n");
        let dataset = DatasetReader::new().parse_bytes(&bytes, &source()).unwrap();
        assert_eq!(dataset.len(), 1);

        // 0xB5 is the micro sign in Windows-1252
        let latin = b"date_time,PM2.5,NO2,CO,note\xB5\n2014-01-01,1,2,3,x\n";
        let dataset = DatasetReader::new().parse_bytes(latin, &source()).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_read_file_buffered_and_mapped() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        write!(temp_file, "{}", SAMPLE)?;

        let buffered = DatasetReader::new()
            .with_mmap(false)
            .read_dataset(temp_file.path())?;
        let mapped = DatasetReader::new()
            .with_mmap(true)
            .read_dataset(temp_file.path())?;

        assert_eq!(buffered, mapped);
        assert_eq!(buffered.len(), 3);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = DatasetReader::new()
            .read_dataset(Path::new("does/not/exist.csv"))
            .unwrap_err();
        assert!(err.is_load_error());
    }
}
