use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{Catalog, Country, Indicator, Source};
use super::observation::{Observation, ObservationTable};

// ---------------------------------------------------------------------------
// Catalog file
// ---------------------------------------------------------------------------

/// Everything read from a catalog file: validated sources and countries
/// plus the indicators of every source.
#[derive(Debug, Clone)]
pub struct CatalogFile {
    pub catalog: Catalog,
    pub indicators: Vec<Indicator>,
}

#[derive(Deserialize)]
struct RawCatalog {
    sources: Vec<Source>,
    countries: Vec<Country>,
    #[serde(default)]
    indicators: Vec<Indicator>,
}

/// Load a catalog JSON file.
///
/// ```json
/// {
///   "sources":    [{ "id": "2", "name": "World Development Indicators" }],
///   "countries":  [{ "id": "DEU", "name": "Germany",
///                    "region": { "id": "ECS", "value": "Europe & Central Asia" },
///                    "incomeLevel": { "id": "HIC", "value": "High income" } }],
///   "indicators": [{ "id": "NY.GDP.MKTP.CD", "name": "GDP (current US$)",
///                    "sourceNote": "...", "source": { "id": "2", "value": "..." } }]
/// }
/// ```
///
/// Records follow the World Bank API field names so downloaded lists can be
/// pasted in as they are.
pub fn load_catalog(path: &Path) -> Result<CatalogFile> {
    let text = std::fs::read_to_string(path).context("reading catalog file")?;
    let raw: RawCatalog = serde_json::from_str(&text).context("parsing catalog JSON")?;

    let catalog = Catalog::new(raw.sources, raw.countries).context("validating catalog")?;
    catalog
        .validate_indicators(&raw.indicators)
        .context("validating indicators")?;

    log::info!(
        "Loaded catalog: {} sources, {} countries, {} indicators",
        catalog.sources().len(),
        catalog.countries().len(),
        raw.indicators.len()
    );
    Ok(CatalogFile {
        catalog,
        indicators: raw.indicators,
    })
}

// ---------------------------------------------------------------------------
// Observation files – public entry-point
// ---------------------------------------------------------------------------

/// Load an observation table from a file.  Dispatch by extension.
///
/// Every format is "long": one row per (indicator, country, period).
/// * `.parquet` – columns `indicator`, `country`, `period`, `value`
/// * `.json`    – records, or a World Bank v2 API response page
/// * `.csv`     – header `indicator,country,period,value`
pub fn load_observations(path: &Path) -> Result<ObservationTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    log::info!(
        "Loaded {} observations for {} indicators from {}",
        table.len(),
        table.indicator_ids().count(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Two accepted layouts.
///
/// Plain records:
/// ```json
/// [{ "indicator": "SP.POP.TOTL", "country": "DEU", "date": "2021", "value": 83.1 }, ...]
/// ```
///
/// A World Bank v2 response page (`[meta, rows]`):
/// ```json
/// [{ "page": 1, "pages": 1, ... },
///  [{ "indicator": { "id": "SP.POP.TOTL", "value": "..." },
///     "country": { "id": "DE", "value": "Germany" },
///     "countryiso3code": "DEU", "date": "2021", "value": 83129285 }]]
/// ```
fn load_json(path: &Path) -> Result<ObservationTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    parse_json_observations(&root)
}

fn parse_json_observations(root: &JsonValue) -> Result<ObservationTable> {
    let top = root.as_array().context("Expected top-level JSON array")?;

    let records = match top.as_slice() {
        [JsonValue::Object(meta), JsonValue::Array(rows)] if meta.contains_key("page") => rows,
        [JsonValue::Object(meta)] if meta.contains_key("message") => {
            bail!("Source returned an error message: {}", meta["message"])
        }
        _ => top,
    };

    let mut table = ObservationTable::default();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let indicator = json_key(obj.get("indicator"))
            .with_context(|| format!("Row {i}: missing 'indicator'"))?;
        let country = obj
            .get("countryiso3code")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| json_key(obj.get("country")))
            .with_context(|| format!("Row {i}: missing 'country'"))?;
        let period = json_key(obj.get("date").or_else(|| obj.get("period")))
            .with_context(|| format!("Row {i}: missing 'date'"))?;
        let value = match obj.get("value") {
            None | Some(JsonValue::Null) => None,
            Some(v) => Some(
                v.as_f64()
                    .with_context(|| format!("Row {i}: value is not a number"))?,
            ),
        };

        table.insert(Observation::new(&indicator, &country, &period, value));
    }
    Ok(table)
}

/// An identifier given either inline or as a World Bank `{ "id": .. }` object.
fn json_key(val: Option<&JsonValue>) -> Option<String> {
    match val? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Object(obj) => obj.get("id").and_then(|id| id.as_str()).map(str::to_string),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with `indicator`, `country`, `period` (or `date`)
/// and `value`. An empty, `NA` or `nan` value is a missing observation.
fn load_csv(path: &Path) -> Result<ObservationTable> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    parse_csv_observations(reader)
}

fn parse_csv_observations<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> Result<ObservationTable> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let column = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.contains(&h.as_str()))
            .with_context(|| format!("CSV missing '{}' column", names[0]))
    };
    let indicator_idx = column(&["indicator"])?;
    let country_idx = column(&["country"])?;
    let period_idx = column(&["period", "date"])?;
    let value_idx = column(&["value"])?;

    let mut table = ObservationTable::default();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let value = parse_value(field(value_idx))
            .with_context(|| format!("CSV row {row_no}: '{}' is not a number", field(value_idx)))?;
        table.insert(Observation::new(
            field(indicator_idx),
            field(country_idx),
            field(period_idx),
            value,
        ));
    }
    Ok(table)
}

fn parse_value(s: &str) -> Result<Option<f64>> {
    if s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    Ok(Some(s.parse::<f64>()?))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of observations.
///
/// Expected schema:
/// - `indicator`, `country`: Utf8 / LargeUtf8
/// - `period`: Utf8 / LargeUtf8 / Int32 / Int64
/// - `value`: Float64 / Float32 / Int64 / Int32, nullable
fn load_parquet(path: &Path) -> Result<ObservationTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut table = ObservationTable::default();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let indicator_col = batch_column(&batch, "indicator")?;
        let country_col = batch_column(&batch, "country")?;
        let period_col = batch_column(&batch, "period")?;
        let value_col = batch_column(&batch, "value")?;

        for row in 0..batch.num_rows() {
            let key = |col: &ArrayRef, name: &str| -> Result<String> {
                string_cell(col, row)?
                    .with_context(|| format!("Row {row}: null '{name}'"))
            };
            let indicator = key(indicator_col, "indicator")?;
            let country = key(country_col, "country")?;
            let period = key(period_col, "period")?;
            let value = float_cell(value_col, row)
                .with_context(|| format!("Row {row}: failed to read 'value'"))?;

            table.insert(Observation::new(&indicator, &country, &period, value));
        }
    }

    Ok(table)
}

// -- Parquet / Arrow helpers --

fn batch_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
    Ok(batch.column(idx))
}

/// Read a key cell as text. Integer columns (e.g. years) are stringified.
fn string_cell(col: &ArrayRef, row: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let s = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        other => bail!("Expected a string or integer column, got {other:?}"),
    };
    Ok(Some(s))
}

fn float_cell(col: &ArrayRef, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let v = match col.data_type() {
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row) as f64,
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row) as f64,
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row) as f64,
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    Ok(Some(v))
}
