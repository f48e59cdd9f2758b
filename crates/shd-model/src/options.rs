//! Policy options shared by the preparation jobs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What to do when two raw column names normalize to the same canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Abort with an error naming the colliding columns.
    #[default]
    Error,
    /// Keep the first column, drop later ones.
    FirstWins,
    /// Keep the last column's data at the first column's position.
    LastWins,
    /// Keep every column, appending `_2`, `_3`, ... to later ones.
    Suffix,
}

/// What to do when a joined table carries a non-key column the merged table
/// already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Abort the merge.
    Error,
    /// Keep the existing column and ignore the incoming one.
    KeepLeft,
    /// Replace the existing column with the incoming one.
    KeepRight,
    /// Keep both, renaming the incoming column `<name>_<source>`.
    Suffix,
    /// Keep both, renaming the existing column `<name>_x` in place and the
    /// incoming one `<name>_y`.
    #[default]
    SuffixXy,
}

/// Which year a subset keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "YearSelectorRepr", into = "YearSelectorRepr")]
pub enum YearSelector {
    Year(i64),
    /// The maximum year present in the table.
    Latest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum YearSelectorRepr {
    Year(i64),
    Text(String),
}

impl TryFrom<YearSelectorRepr> for YearSelector {
    type Error = String;

    fn try_from(value: YearSelectorRepr) -> Result<Self, Self::Error> {
        match value {
            YearSelectorRepr::Year(year) => Ok(YearSelector::Year(year)),
            YearSelectorRepr::Text(text) => text.parse(),
        }
    }
}

impl From<YearSelector> for YearSelectorRepr {
    fn from(value: YearSelector) -> Self {
        match value {
            YearSelector::Year(year) => YearSelectorRepr::Year(year),
            YearSelector::Latest => YearSelectorRepr::Text("latest".to_string()),
        }
    }
}

impl FromStr for YearSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(YearSelector::Latest);
        }
        trimmed
            .parse::<i64>()
            .map(YearSelector::Year)
            .map_err(|_| format!("expected a year or 'latest', got '{trimmed}'"))
    }
}

impl fmt::Display for YearSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearSelector::Year(year) => write!(f, "{year}"),
            YearSelector::Latest => f.write_str("latest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_selector_parses() {
        assert_eq!("2020".parse::<YearSelector>(), Ok(YearSelector::Year(2020)));
        assert_eq!("Latest".parse::<YearSelector>(), Ok(YearSelector::Latest));
        assert!("twenty".parse::<YearSelector>().is_err());
    }

    #[test]
    fn year_selector_deserializes_number_or_text() {
        let year: YearSelector = serde_json::from_str("2020").unwrap();
        assert_eq!(year, YearSelector::Year(2020));
        let latest: YearSelector = serde_json::from_str("\"latest\"").unwrap();
        assert_eq!(latest, YearSelector::Latest);
    }

    #[test]
    fn policies_default() {
        assert_eq!(CollisionPolicy::default(), CollisionPolicy::Error);
        assert_eq!(OverlapPolicy::default(), OverlapPolicy::SuffixXy);
    }
}
