//! # Batch Scoring Module
//!
//! Non-interactive counterpart of the form: reads a headered CSV of
//! raw-input records, encodes and predicts every record, and writes an
//! estimates CSV.
//!
//! - Strict Schema: column names are not configurable. The reader expects
//!   `age, sex, height, height_unit, weight, bmi, children, smoker, region`;
//!   `height`, `height_unit`, `weight`, and `bmi` may be empty.
//! - User-Centric Errors: failures are assumed to be user-input errors and
//!   carry the 1-based record number so the offending row can be found.

use ndarray::Array2;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::encode::{self, EncodeError, FEATURE_COUNT, FeatureVector};
use crate::input::{HeightUnit, RawInput, Region, Sex, Smoker};
use crate::model::{ClaimModel, ModelError};

/// One row of the input CSV, before vocabulary validation.
#[derive(Debug, Deserialize)]
struct RawRecord {
    age: u32,
    sex: String,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    height_unit: Option<String>,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    bmi: Option<f64>,
    children: u32,
    smoker: String,
    region: String,
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Record {record}: {message}")]
    InvalidField { record: usize, message: String },
    #[error("Record {record}: {source}")]
    InvalidInput { record: usize, source: EncodeError },
    #[error(transparent)]
    Model(#[from] ModelError),
}

fn to_raw_input(record: RawRecord, record_no: usize) -> Result<RawInput, BatchError> {
    let field_err = |message: String| BatchError::InvalidField {
        record: record_no,
        message,
    };

    let sex = record.sex.parse::<Sex>().map_err(field_err)?;
    let smoker = record
        .smoker
        .parse::<Smoker>()
        .map_err(|message| BatchError::InvalidField {
            record: record_no,
            message,
        })?;
    let height_unit = match record.height_unit.as_deref() {
        None => HeightUnit::Meters,
        Some(s) if s.trim().is_empty() => HeightUnit::Meters,
        Some(s) => s
            .parse::<HeightUnit>()
            .map_err(|message| BatchError::InvalidField {
                record: record_no,
                message,
            })?,
    };
    // Out-of-vocabulary regions degrade to "no region matched", same as
    // everywhere else.
    let region = Region::parse(&record.region);
    if region.is_none() && !record.region.trim().is_empty() {
        log::debug!(
            "record {record_no}: region '{}' not in vocabulary, encoding as unmatched",
            record.region.trim()
        );
    }

    Ok(RawInput {
        age: record.age,
        sex,
        height: record.height,
        height_unit,
        weight: record.weight,
        children: record.children,
        smoker,
        region,
        bmi: record.bmi,
    })
}

/// Scores every record of `input_path` and writes a
/// `record,estimated_claim_amount` CSV to `output_path`. Returns the number
/// of records scored.
pub fn score_csv(
    model: &ClaimModel,
    input_path: &Path,
    output_path: &Path,
) -> Result<usize, BatchError> {
    let mut reader = csv::Reader::from_path(input_path)?;

    let mut vectors: Vec<FeatureVector> = Vec::new();
    for (index, row) in reader.deserialize::<RawRecord>().enumerate() {
        let record_no = index + 1;
        let raw = to_raw_input(row?, record_no)?;
        let vector = encode::encode(&raw).map_err(|source| BatchError::InvalidInput {
            record: record_no,
            source,
        })?;
        vectors.push(vector);
    }

    let flat: Vec<f64> = vectors
        .iter()
        .flat_map(|v| v.as_slice().iter().copied())
        .collect();
    let rows = Array2::from_shape_vec((vectors.len(), FEATURE_COUNT), flat)
        .expect("row-major feature buffer matches its own dimensions");
    let predictions = model.predict_batch(rows.view())?;

    let mut writer = csv::Writer::from_path(output_path)?;
    writer.write_record(["record", "estimated_claim_amount"])?;
    for (index, value) in predictions.iter().enumerate() {
        writer.write_record([(index + 1).to_string(), format!("{value:.2}")])?;
    }
    writer.flush()?;

    log::info!(
        "scored {} records from {} into {}",
        predictions.len(),
        input_path.display(),
        output_path.display()
    );
    Ok(predictions.len())
}
