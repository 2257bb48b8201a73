use crate::error::{ReportError, Result};
use crate::models::{AirQualityRecord, Column, Dataset};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DATE_TIME_COLUMN, DEFAULT_CHUNK_SIZE, DEFAULT_ROW_GROUP_SIZE, WEATHER_COLUMN,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Exports a (possibly filtered) dataset to Parquet, one nullable Float64
/// column per measurement the dataset has.
pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ReportError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    pub fn write_dataset(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        self.write_dataset_batched(dataset, path, DEFAULT_CHUNK_SIZE)
    }

    /// Write in record batches of `batch_size` rows. An empty dataset still
    /// produces a file with the schema and no rows.
    pub fn write_dataset_batched(
        &self,
        dataset: &Dataset,
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        let schema = create_schema(dataset);
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in dataset.records().chunks(batch_size.max(1)) {
            let batch = records_to_batch(dataset, chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        info!(
            rows = dataset.len(),
            path = %path.display(),
            "dataset written to parquet"
        );
        Ok(())
    }

    /// Read an exported file back into a dataset. The schema is taken from the
    /// file's columns.
    pub fn read_dataset(&self, path: &Path) -> Result<Dataset> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut records = Vec::new();
        let mut columns = BTreeSet::new();
        let mut has_weather = false;

        for batch_result in reader {
            let batch = batch_result?;
            let schema = batch.schema();

            let timestamps = batch
                .column_by_name(DATE_TIME_COLUMN)
                .and_then(|c| c.as_any().downcast_ref::<TimestampMillisecondArray>())
                .ok_or_else(|| {
                    ReportError::Config("Invalid date_time column type".to_string())
                })?;

            let mut value_columns = Vec::new();
            for field in schema.fields() {
                if let Some(column) = Column::from_header(field.name()) {
                    let array = batch
                        .column_by_name(field.name())
                        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
                        .ok_or_else(|| {
                            ReportError::Config(format!("Invalid {} column type", field.name()))
                        })?;
                    columns.insert(column);
                    value_columns.push((column, array));
                }
            }

            let weather = batch
                .column_by_name(WEATHER_COLUMN)
                .map(|c| {
                    c.as_any().downcast_ref::<UInt8Array>().ok_or_else(|| {
                        ReportError::Config("Invalid weathersit column type".to_string())
                    })
                })
                .transpose()?;
            has_weather |= weather.is_some();

            for i in 0..batch.num_rows() {
                let date_time = DateTime::from_timestamp_millis(timestamps.value(i))
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| {
                        ReportError::Config("Invalid timestamp in Parquet file".to_string())
                    })?;

                let mut record = AirQualityRecord::new(date_time);
                for (column, array) in &value_columns {
                    if !array.is_null(i) {
                        record.set_value(*column, Some(array.value(i)));
                    }
                }
                if let Some(weather) = weather {
                    if !weather.is_null(i) {
                        record.weathersit = Some(weather.value(i));
                    }
                }
                records.push(record);
            }
        }

        debug!(rows = records.len(), path = %path.display(), "parquet read back");
        Ok(Dataset::new(records, columns, has_weather))
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();
        let columns = metadata
            .file_metadata()
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            columns,
            file_size,
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// date_time, then the dataset's measurement columns, then weathersit when
/// the dataset has it.
fn create_schema(dataset: &Dataset) -> Arc<Schema> {
    let mut fields = vec![Field::new(
        DATE_TIME_COLUMN,
        DataType::Timestamp(TimeUnit::Millisecond, None),
        false,
    )];
    fields.extend(
        dataset
            .columns()
            .iter()
            .map(|c| Field::new(c.header(), DataType::Float64, true)),
    );
    if dataset.has_weather_column() {
        fields.push(Field::new(WEATHER_COLUMN, DataType::UInt8, true));
    }

    Arc::new(Schema::new(fields))
}

fn records_to_batch(
    dataset: &Dataset,
    records: &[AirQualityRecord],
    schema: Arc<Schema>,
) -> Result<RecordBatch> {
    let timestamps: Vec<i64> = records
        .iter()
        .map(|r| r.date_time.and_utc().timestamp_millis())
        .collect();

    let mut arrays: Vec<ArrayRef> = vec![Arc::new(TimestampMillisecondArray::from(timestamps))];
    for column in dataset.columns() {
        let values: Vec<Option<f64>> = records.iter().map(|r| r.value(*column)).collect();
        arrays.push(Arc::new(Float64Array::from(values)));
    }
    if dataset.has_weather_column() {
        let codes: Vec<Option<u8>> = records.iter().map(|r| r.weathersit).collect();
        arrays.push(Arc::new(UInt8Array::from(codes)));
    }

    Ok(RecordBatch::try_new(schema, arrays)?)
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub columns: Vec<String>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Columns: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.columns.join(", "),
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    fn sample_dataset(rows: u32) -> Dataset {
        let records = (0..rows)
            .map(|h| {
                let ts = NaiveDate::from_ymd_opt(2016, 3, 1)
                    .unwrap()
                    .and_hms_opt(h % 24, 0, 0)
                    .unwrap();
                let mut builder = AirQualityRecord::builder(ts)
                    .value(Column::Pm25, 10.0 + h as f64)
                    .value(Column::No2, 20.0)
                    .weathersit((h % 3 + 1) as u8);
                if h % 2 == 0 {
                    builder = builder.value(Column::Co, 500.0);
                }
                builder.build()
            })
            .collect();
        Dataset::with_full_schema(records)
    }

    #[test]
    fn test_write_and_read_back() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;
        let dataset = sample_dataset(5);

        writer.write_dataset(&dataset, temp_file.path())?;
        let restored = writer.read_dataset(temp_file.path())?;

        assert_eq!(restored, dataset);
        Ok(())
    }

    #[test]
    fn test_partial_schema_columns() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;
        let full = sample_dataset(3);
        let columns: BTreeSet<Column> = [Column::Pm25, Column::No2, Column::Co].into();
        let dataset = Dataset::new(full.records().to_vec(), columns, false);

        writer.write_dataset(&dataset, temp_file.path())?;
        let info = writer.get_file_info(temp_file.path())?;

        assert_eq!(info.total_rows, 3);
        assert_eq!(info.columns, vec!["date_time", "PM2.5", "NO2", "CO"]);
        Ok(())
    }

    #[test]
    fn test_batched_row_groups() -> Result<()> {
        let writer = ParquetWriter::new().with_row_group_size(10);
        let temp_file = NamedTempFile::new()?;

        writer.write_dataset_batched(&sample_dataset(25), temp_file.path(), 10)?;
        let info = writer.get_file_info(temp_file.path())?;

        assert_eq!(info.total_rows, 25);
        assert_eq!(info.row_groups, 3);
        assert!(info.summary().contains("Total rows: 25"));
        Ok(())
    }

    #[test]
    fn test_empty_dataset_writes_schema_only() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_dataset(&Dataset::with_full_schema(Vec::new()), temp_file.path())?;
        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 0);
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        for compression in ["snappy", "gzip", "lz4", "zstd", "none"] {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;
            let result = writer.write_dataset(&sample_dataset(2), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli-9").is_err());
        Ok(())
    }
}
