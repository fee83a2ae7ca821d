//! Year selection for batch runs.
//!
//! Accepted forms: `all`, `last`, a single year (`1390`), an inclusive range
//! (`1390-1395`), or a comma separated list of years and ranges
//! (`1385,1390-1392`).

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{ConfigError, Result};
use crate::layout::DataLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearSelection {
    All,
    Last,
    Years(Vec<YearItem>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearItem {
    Single(u32),
    Range(u32, u32),
}

impl FromStr for YearSelection {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "all" => return Ok(Self::All),
            "last" => return Ok(Self::Last),
            _ => {}
        }
        let mut items = Vec::new();
        for part in trimmed.split(',') {
            items.push(parse_item(part.trim(), input)?);
        }
        Ok(Self::Years(items))
    }
}

fn parse_item(part: &str, input: &str) -> Result<YearItem> {
    let invalid = |reason: &str| ConfigError::InvalidYears {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    if part.is_empty() {
        return Err(invalid("empty item"));
    }
    match part.split_once('-') {
        Some((start, end)) => {
            let start = parse_year(start.trim()).ok_or_else(|| invalid("range start is not a year"))?;
            let end = parse_year(end.trim()).ok_or_else(|| invalid("range end is not a year"))?;
            if start > end {
                return Err(invalid("range start is after range end"));
            }
            Ok(YearItem::Range(start, end))
        }
        None => parse_year(part)
            .map(YearItem::Single)
            .ok_or_else(|| invalid("not a year")),
    }
}

fn parse_year(text: &str) -> Option<u32> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

impl YearSelection {
    /// Expand into sorted, de-duplicated years within `first..=last`.
    ///
    /// Items are checked against the bounds before any range is expanded.
    pub fn expand(&self, first: u32, last: u32) -> Result<Vec<u32>> {
        let out_of_range = |year: u32| ConfigError::YearOutOfRange { year, first, last };
        let years: BTreeSet<u32> = match self {
            Self::All => (first..=last).collect(),
            Self::Last => BTreeSet::from([last]),
            Self::Years(items) => {
                let mut years = BTreeSet::new();
                for item in items {
                    let (start, end) = match *item {
                        YearItem::Single(year) => (year, year),
                        YearItem::Range(start, end) => (start, end),
                    };
                    if start < first {
                        return Err(out_of_range(start));
                    }
                    if end > last {
                        return Err(out_of_range(end));
                    }
                    years.extend(start..=end);
                }
                years
            }
        };
        Ok(years.into_iter().collect())
    }

    pub fn expand_for(&self, layout: &DataLayout) -> Result<Vec<u32>> {
        self.expand(layout.first_year, layout.last_year)
    }
}
