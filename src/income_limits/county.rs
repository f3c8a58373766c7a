//! County income limits from a published spreadsheet.
//!
//! The spreadsheet is read as a CSV export with a header row. Each data row is
//! `county, limit for 1 person, limit for 2 people, ...`. Cells may carry `$`
//! and thousands separators; blank or malformed cells are missing values.

use std::collections::BTreeMap;
use std::io::Read;
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::cache::CacheSource;
use crate::error::IncomeLimitError;

/// Appends " County" unless the name already ends with it.
pub fn normalize_county(county: &str) -> String {
    let county = county.trim();
    if county.to_lowercase().ends_with("county") {
        county.to_string()
    } else {
        format!("{county} County")
    }
}

/// Income limits by county and household size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountyLimitTable {
    rows: BTreeMap<String, Vec<Option<Decimal>>>,
}

impl CountyLimitTable {
    /// Parses a CSV export.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut rows = BTreeMap::new();
        for record in csv.records() {
            let record = record?;
            let Some(county) = record.get(0) else {
                continue;
            };
            if county.trim().is_empty() {
                continue;
            }
            let amounts = record.iter().skip(1).map(parse_amount).collect();
            rows.insert(normalize_county(county), amounts);
        }
        Ok(Self { rows })
    }

    /// True before the first successful load.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Income limit for a household of `size` in `county`.
    pub fn lookup(&self, county: &str, state: &str, size: usize) -> Result<Decimal, IncomeLimitError> {
        if self.rows.is_empty() {
            return Err(IncomeLimitError::unavailable(format!(
                "county income limits for {state} are not loaded"
            )));
        }

        let county = normalize_county(county);
        let amounts = self
            .rows
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&county))
            .map(|(_, amounts)| amounts)
            .ok_or_else(|| IncomeLimitError::CountyNotFound {
                county: county.clone(),
                state: state.to_string(),
            })?;

        if size == 0 || size > amounts.len() {
            return Err(IncomeLimitError::HouseholdSizeOutOfRange {
                size,
                min: 1,
                max: amounts.len(),
            });
        }

        amounts[size - 1].ok_or_else(|| IncomeLimitError::MissingValue {
            detail: format!("{county}, household of {size}"),
        })
    }
}

fn parse_amount(cell: &str) -> Option<Decimal> {
    let cleaned: String = cell
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Downloads the spreadsheet export.
pub struct CountyIncomeLimitSource {
    http: reqwest::Client,
    url: String,
}

impl CountyIncomeLimitSource {
    /// Creates a source reading `url`.
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CacheSource for CountyIncomeLimitSource {
    type Key = ();
    type Value = CountyLimitTable;
    type Error = IncomeLimitError;

    fn name(&self) -> &'static str {
        "county_income_limits"
    }

    async fn update(&self, _key: &()) -> Result<CountyLimitTable, IncomeLimitError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(IncomeLimitError::unavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(IncomeLimitError::unavailable(format!(
                "spreadsheet export returned {status}"
            )));
        }

        let body = response.bytes().await.map_err(IncomeLimitError::unavailable)?;
        CountyLimitTable::from_csv(body.as_ref()).map_err(IncomeLimitError::unavailable)
    }
}
