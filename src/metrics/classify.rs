//! Traffic classification heuristics
//!
//! Upstream channel taxonomies are labelled inconsistently, so these checks
//! are substring based and accept some false positives.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::models::Row;

const CHANNEL_FIELDS: &[&str] = &["Channel", "channel", "CHANNEL"];
const SOURCE_FIELDS: &[&str] = &["Source", "source", "SOURCE"];
const MEDIUM_FIELDS: &[&str] = &["Medium", "medium", "MEDIUM"];

pub fn is_paid_search_channel(label: &str) -> bool {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return false;
    }

    label == "paid search"
        || (label.contains("paid") && label.contains("search"))
        || label.contains("cpc")
        || label.contains("ppc")
}

pub fn is_google_cpc(source: &str, medium: &str) -> bool {
    let source = source.trim().to_lowercase();
    let medium = medium.trim().to_lowercase();

    source.contains("google") && (medium.contains("cpc") || medium.contains("ppc"))
}

/// Row predicate applied before aggregation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFilter {
    #[default]
    None,
    PaidSearch,
    GoogleCpc,
}

impl RowFilter {
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            RowFilter::None => true,
            RowFilter::PaidSearch => is_paid_search_channel(text_field(row, CHANNEL_FIELDS)),
            RowFilter::GoogleCpc => is_google_cpc(
                text_field(row, SOURCE_FIELDS),
                text_field(row, MEDIUM_FIELDS),
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RowFilter::None => "none",
            RowFilter::PaidSearch => "paid_search",
            RowFilter::GoogleCpc => "google_cpc",
        }
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "none" | "all" => Ok(RowFilter::None),
            "paid_search" => Ok(RowFilter::PaidSearch),
            "google_cpc" => Ok(RowFilter::GoogleCpc),
            _ => Err(format!(
                "unknown filter '{s}'. Supported values: none, paid_search, google_cpc"
            )),
        }
    }
}

/// First string-valued candidate field, or "" when none is present
pub(crate) fn text_field<'a>(row: &'a Row, candidates: &[&str]) -> &'a str {
    candidates
        .iter()
        .find_map(|name| match row.get(*name) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        })
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_paid_search_labels() {
        assert!(is_paid_search_channel("Paid Search"));
        assert!(is_paid_search_channel("  PAID SEARCH "));
        assert!(is_paid_search_channel("Search (Paid)"));
        assert!(is_paid_search_channel("google-cpc"));
        assert!(is_paid_search_channel("PPC campaigns"));
        assert!(!is_paid_search_channel("Organic"));
        assert!(!is_paid_search_channel("Organic Search"));
        assert!(!is_paid_search_channel("Paid Social"));
        assert!(!is_paid_search_channel(""));
        assert!(!is_paid_search_channel("   "));
    }

    #[test]
    fn test_google_cpc_pairs() {
        assert!(is_google_cpc("google.com", "cpc"));
        assert!(is_google_cpc(" Google ", "CPC"));
        assert!(is_google_cpc("google", "paid-ppc"));
        assert!(!is_google_cpc("bing", "cpc"));
        assert!(!is_google_cpc("google", "organic"));
        assert!(!is_google_cpc("", ""));
    }

    #[test]
    fn test_filter_reads_row_fields() {
        let paid = row(json!({"Channel": "Paid Search", "URL": "https://x.com"}));
        let organic = row(json!({"channel": "Organic Search"}));
        let missing = row(json!({"URL": "https://x.com"}));

        assert!(RowFilter::PaidSearch.matches(&paid));
        assert!(!RowFilter::PaidSearch.matches(&organic));
        assert!(!RowFilter::PaidSearch.matches(&missing));
        assert!(RowFilter::None.matches(&missing));

        let cpc = row(json!({"source": "google", "Medium": "cpc"}));
        let non_string = row(json!({"Source": 7, "Medium": "cpc"}));
        assert!(RowFilter::GoogleCpc.matches(&cpc));
        assert!(!RowFilter::GoogleCpc.matches(&non_string));
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!("paid-search".parse::<RowFilter>().unwrap(), RowFilter::PaidSearch);
        assert_eq!("GOOGLE_CPC".parse::<RowFilter>().unwrap(), RowFilter::GoogleCpc);
        assert!("adgroup".parse::<RowFilter>().is_err());
    }
}
