use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Builder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rusty_econ::data::model::{Category, Country, Indicator, Source};
use serde_json::json;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const FIRST_YEAR: u32 = 2000;
const LAST_YEAR: u32 = 2022;
const GAP_PROBABILITY: f64 = 0.08;

/// (id, name, region id, region, income id, income level, size factor)
const COUNTRIES: &[(&str, &str, &str, &str, &str, &str, f64)] = &[
    ("DEU", "Germany", "ECS", "Europe & Central Asia", "HIC", "High income", 4.0),
    ("FRA", "France", "ECS", "Europe & Central Asia", "HIC", "High income", 2.9),
    ("POL", "Poland", "ECS", "Europe & Central Asia", "HIC", "High income", 0.7),
    ("USA", "United States", "NAC", "North America", "HIC", "High income", 21.0),
    ("BRA", "Brazil", "LCN", "Latin America & Caribbean", "UMC", "Upper middle income", 1.9),
    ("MEX", "Mexico", "LCN", "Latin America & Caribbean", "UMC", "Upper middle income", 1.3),
    ("IND", "India", "SAS", "South Asia", "LMC", "Lower middle income", 3.1),
    ("NGA", "Nigeria", "SSF", "Sub-Saharan Africa", "LMC", "Lower middle income", 0.45),
    ("SSD", "South Sudan", "SSF", "Sub-Saharan Africa", "LIC", "Low income", 0.01),
];

/// Published in the catalog but never reported for any indicator.
const SILENT_COUNTRY: &str = "SSD";

/// (id, name, source id, note, base, yearly trend, noise)
const INDICATORS: &[(&str, &str, &str, &str, f64, f64, f64)] = &[
    (
        "NY.GDP.MKTP.CD",
        "GDP (current US$)",
        "2",
        "GDP at purchaser's prices, in current U.S. dollars (scaled by the country size).",
        1.0e12,
        0.03,
        0.02,
    ),
    (
        "SP.POP.TOTL",
        "Population, total",
        "2",
        "Total population counts all residents regardless of legal status or citizenship.",
        5.0e7,
        0.008,
        0.002,
    ),
    (
        "FP.CPI.TOTL.ZG",
        "Inflation, consumer prices (annual %)",
        "2",
        "Annual percentage change in the cost to the average consumer of a basket of goods.",
        3.0,
        0.0,
        1.5,
    ),
    (
        "BN.CAB.XOKA.GD.ZS",
        "Current account balance (% of GDP)",
        "2",
        "Sum of net exports of goods and services, net primary income and net secondary income.",
        0.0,
        0.0,
        3.0,
    ),
    (
        "IC.BUS.EASE.XQ",
        "Ease of doing business score",
        "6",
        "Aggregate score on a 0-100 scale; 100 represents the best regulatory performance.",
        65.0,
        0.004,
        2.0,
    ),
];

/// Value for one (indicator, country, year); `None` leaves a gap.
fn sample_value(
    rng: &mut SimpleRng,
    indicator: &(&str, &str, &str, &str, f64, f64, f64),
    size: f64,
    year: u32,
) -> Option<f64> {
    let &(id, _, _, _, base, trend, noise) = indicator;
    if rng.next_f64() < GAP_PROBABILITY {
        return None;
    }
    let t = f64::from(year - FIRST_YEAR);
    let value = match id {
        // Levels scale with the country and grow geometrically.
        "NY.GDP.MKTP.CD" | "SP.POP.TOTL" => {
            base * size * (1.0 + trend).powf(t) * (1.0 + rng.gauss(0.0, noise))
        }
        // Balances swing around zero with a per-country bias.
        "BN.CAB.XOKA.GD.ZS" => (size - 2.0).clamp(-4.0, 6.0) + rng.gauss(0.0, noise),
        _ => base * (1.0 + trend).powf(t) + rng.gauss(0.0, noise),
    };
    Some(value)
}

fn write_catalog(path: &str) -> Result<()> {
    let sources = vec![
        Source {
            id: "2".into(),
            name: "World Development Indicators".into(),
        },
        Source {
            id: "6".into(),
            name: "Doing Business".into(),
        },
    ];
    let source_name = |id: &str| {
        sources
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.clone())
            .unwrap_or_default()
    };

    let countries: Vec<Country> = COUNTRIES
        .iter()
        .map(|&(id, name, region_id, region, income_id, income, _)| Country {
            id: id.into(),
            name: name.into(),
            region: Category::new(region_id, region),
            income_level: Category::new(income_id, income),
        })
        .collect();

    let indicators: Vec<Indicator> = INDICATORS
        .iter()
        .map(|&(id, name, source, note, ..)| Indicator {
            id: id.into(),
            name: name.into(),
            source_note: note.into(),
            source: Category::new(source, &source_name(source)),
        })
        .collect();

    let doc = json!({
        "sources": sources,
        "countries": countries,
        "indicators": indicators,
    });
    let text = serde_json::to_string_pretty(&doc)?;
    std::fs::write(path, text).with_context(|| format!("writing {path}"))?;
    Ok(())
}

fn write_observations(path: &str, rng: &mut SimpleRng) -> Result<usize> {
    let mut all_indicator: Vec<&str> = Vec::new();
    let mut all_country: Vec<&str> = Vec::new();
    let mut all_period: Vec<String> = Vec::new();
    let mut values = Float64Builder::new();

    for indicator in INDICATORS {
        for &(country, _, _, _, _, _, size) in COUNTRIES {
            if country == SILENT_COUNTRY {
                continue;
            }
            // Newest first, like the World Bank API.
            for year in (FIRST_YEAR..=LAST_YEAR).rev() {
                all_indicator.push(indicator.0);
                all_country.push(country);
                all_period.push(year.to_string());
                values.append_option(sample_value(rng, indicator, size, year));
            }
        }
    }
    let rows = all_indicator.len();

    let schema = Arc::new(Schema::new(vec![
        Field::new("indicator", DataType::Utf8, false),
        Field::new("country", DataType::Utf8, false),
        Field::new("period", DataType::Utf8, false),
        Field::new("value", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(all_indicator)),
            Arc::new(StringArray::from(all_country)),
            Arc::new(StringArray::from(all_period)),
            Arc::new(values.finish()),
        ],
    )
    .context("Failed to create RecordBatch")?;

    // Write Parquet
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(rows)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let catalog_path = "sample_catalog.json";
    write_catalog(catalog_path)?;

    let observations_path = "sample_observations.parquet";
    let rows = write_observations(observations_path, &mut rng)?;

    println!(
        "Wrote {} countries and {} indicators to {catalog_path}",
        COUNTRIES.len(),
        INDICATORS.len()
    );
    println!("Wrote {rows} observations ({FIRST_YEAR}-{LAST_YEAR}) to {observations_path}");
    Ok(())
}
