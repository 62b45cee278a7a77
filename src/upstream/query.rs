use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::metrics::RowFilter;

pub const MIN_DAYS: u8 = 1;
pub const MAX_DAYS: u8 = 3;

/// Most dimensions a single export call may group by
pub const MAX_DIMENSIONS: usize = 3;

/// Clamp a requested day count into the range the export API accepts
pub fn clamp_days(days: i64) -> u8 {
    days.clamp(MIN_DAYS as i64, MAX_DAYS as i64) as u8
}

/// Grouping axis understood by the export API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "URL")]
    Url,
    Channel,
    Source,
    Medium,
    Campaign,
    Browser,
    Device,
    #[serde(rename = "OS")]
    Os,
    #[serde(rename = "Country/Region")]
    CountryRegion,
    #[serde(rename = "Page Title")]
    PageTitle,
    #[serde(rename = "Referrer URL")]
    ReferrerUrl,
}

impl Dimension {
    /// Name sent as a `dimensionN` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Url => "URL",
            Dimension::Channel => "Channel",
            Dimension::Source => "Source",
            Dimension::Medium => "Medium",
            Dimension::Campaign => "Campaign",
            Dimension::Browser => "Browser",
            Dimension::Device => "Device",
            Dimension::Os => "OS",
            Dimension::CountryRegion => "Country/Region",
            Dimension::PageTitle => "Page Title",
            Dimension::ReferrerUrl => "Referrer URL",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match compact.as_str() {
            "url" => Ok(Dimension::Url),
            "channel" => Ok(Dimension::Channel),
            "source" => Ok(Dimension::Source),
            "medium" => Ok(Dimension::Medium),
            "campaign" => Ok(Dimension::Campaign),
            "browser" => Ok(Dimension::Browser),
            "device" => Ok(Dimension::Device),
            "os" => Ok(Dimension::Os),
            "country" | "countryregion" => Ok(Dimension::CountryRegion),
            "pagetitle" => Ok(Dimension::PageTitle),
            "referrer" | "referrerurl" => Ok(Dimension::ReferrerUrl),
            _ => Err(format!("unknown dimension '{s}'")),
        }
    }
}

/// Cache signature and upstream parameters for one export call.
///
/// The day count is clamped on construction, so two requests asking for
/// e.g. 0 and 1 days share a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    days: u8,
    dimension1: Dimension,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimension2: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimension3: Option<Dimension>,
}

impl ExportQuery {
    pub fn new(
        days: i64,
        dimension1: Dimension,
        dimension2: Option<Dimension>,
        dimension3: Option<Dimension>,
    ) -> Self {
        Self {
            days: clamp_days(days),
            dimension1,
            dimension2,
            dimension3,
        }
    }

    /// Query for an arbitrary list of one to [`MAX_DIMENSIONS`] dimensions
    pub fn from_dimensions(days: i64, dimensions: &[Dimension]) -> Result<Self, String> {
        match *dimensions {
            [d1] => Ok(Self::new(days, d1, None, None)),
            [d1, d2] => Ok(Self::new(days, d1, Some(d2), None)),
            [d1, d2, d3] => Ok(Self::new(days, d1, Some(d2), Some(d3))),
            _ => Err(format!(
                "an export takes 1 to {MAX_DIMENSIONS} dimensions, got {}",
                dimensions.len()
            )),
        }
    }

    pub fn days(&self) -> u8 {
        self.days
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        std::iter::once(self.dimension1)
            .chain(self.dimension2)
            .chain(self.dimension3)
    }
}

impl fmt::Display for ExportQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "days={}", self.days)?;
        for (idx, dimension) in self.dimensions().enumerate() {
            write!(f, " dimension{}={}", idx + 1, dimension)?;
        }
        Ok(())
    }
}

/// Dimension set requested for a metrics computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionProfile {
    #[default]
    Url,
    Channel,
    SourceMedium,
}

impl DimensionProfile {
    /// Export query issued for this profile. URL is always the last dimension
    /// so rows carry the page they belong to.
    pub fn query(&self, days: i64) -> ExportQuery {
        match self {
            DimensionProfile::Url => ExportQuery::new(days, Dimension::Url, None, None),
            DimensionProfile::Channel => {
                ExportQuery::new(days, Dimension::Channel, Some(Dimension::Url), None)
            }
            DimensionProfile::SourceMedium => ExportQuery::new(
                days,
                Dimension::Source,
                Some(Dimension::Medium),
                Some(Dimension::Url),
            ),
        }
    }

    pub fn default_filter(&self) -> RowFilter {
        match self {
            DimensionProfile::Url => RowFilter::None,
            DimensionProfile::Channel => RowFilter::PaidSearch,
            DimensionProfile::SourceMedium => RowFilter::GoogleCpc,
        }
    }

    /// Whether rows fetched with this profile carry the fields `filter` reads
    pub fn supports(&self, filter: RowFilter) -> bool {
        match filter {
            RowFilter::None => true,
            RowFilter::PaidSearch => matches!(self, DimensionProfile::Channel),
            RowFilter::GoogleCpc => matches!(self, DimensionProfile::SourceMedium),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionProfile::Url => "url",
            DimensionProfile::Channel => "channel",
            DimensionProfile::SourceMedium => "source_medium",
        }
    }
}

impl fmt::Display for DimensionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DimensionProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "url" => Ok(DimensionProfile::Url),
            "channel" => Ok(DimensionProfile::Channel),
            "source_medium" | "sourcemedium" => Ok(DimensionProfile::SourceMedium),
            _ => Err(format!(
                "unknown profile '{s}'. Supported values: url, channel, source_medium"
            )),
        }
    }
}
