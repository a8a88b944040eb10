use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing category strings at the boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CategoryError {
    #[error("unknown category: {0}")]
    Unknown(String),
}

/// Closed set of exam topic buckets used for per-topic statistics.
///
/// Categories arrive as strings from the UI and the content service; anything
/// outside this set is rejected at the boundary instead of silently creating
/// a new bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    PropertyRights,
    BusinessLaw,
    ZoningRestrictions,
    TaxAndPricing,
    Miscellaneous,
}

impl Category {
    /// Number of categories; also the length of per-category tally arrays.
    pub const COUNT: usize = 5;

    /// All categories in a stable order matching `index()`.
    pub const ALL: [Category; Category::COUNT] = [
        Category::PropertyRights,
        Category::BusinessLaw,
        Category::ZoningRestrictions,
        Category::TaxAndPricing,
        Category::Miscellaneous,
    ];

    /// Stable position of this category within `ALL`.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Category::PropertyRights => 0,
            Category::BusinessLaw => 1,
            Category::ZoningRestrictions => 2,
            Category::TaxAndPricing => 3,
            Category::Miscellaneous => 4,
        }
    }

    /// Storage and wire representation of the category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::PropertyRights => "property-rights",
            Category::BusinessLaw => "business-law",
            Category::ZoningRestrictions => "zoning-restrictions",
            Category::TaxAndPricing => "tax-and-pricing",
            Category::Miscellaneous => "miscellaneous",
        }
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "property-rights" => Ok(Category::PropertyRights),
            "business-law" => Ok(Category::BusinessLaw),
            "zoning-restrictions" => Ok(Category::ZoningRestrictions),
            "tax-and-pricing" => Ok(Category::TaxAndPricing),
            "miscellaneous" => Ok(Category::Miscellaneous),
            other => Err(CategoryError::Unknown(other.to_owned())),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
