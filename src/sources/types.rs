use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Newest => "date",
            SortOrder::PriceAsc => "priceasc",
            SortOrder::PriceDesc => "pricedsc",
        }
    }
}

/// Search parameters for one area of a listing site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Site, e.g. "sfbay"
    pub site: String,
    /// Sub-area within the site, e.g. "sby"
    pub area: String,
    /// Housing section, e.g. "apa"
    pub category: String,
    /// Minimum price (USD/month)
    pub min_price: Option<u32>,
    /// Maximum price (USD/month)
    pub max_price: Option<u32>,
    /// Minimum size in square feet
    pub min_size: Option<u32>,
    /// Only listings posted today
    pub posted_today: bool,
    pub sort: SortOrder,
    /// Maximum number of listings returned
    pub limit: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            site: "sfbay".to_string(),
            area: "sby".to_string(),
            category: "apa".to_string(),
            min_price: None,
            max_price: None,
            min_size: None,
            posted_today: false,
            sort: SortOrder::Newest,
            limit: 20,
        }
    }
}
