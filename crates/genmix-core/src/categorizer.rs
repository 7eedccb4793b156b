use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Renewable,
    NonRenewable,
    Uncategorized,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Renewable,
        Category::NonRenewable,
        Category::Uncategorized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Renewable => "renewable",
            Category::NonRenewable => "non-renewable",
            Category::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// "Natural Gas" is listed as renewable by the upstream product definition.
const RENEWABLE_SOURCES: [&str; 11] = [
    "Wind onshore",
    "Natural Gas",
    "Biomass",
    "Wind offshore",
    "Nuclear",
    "Solar",
    "Run-of-River Hydro",
    "Pumped storage generation",
    "Other renewables",
    "Dam Hydro",
    "Geothermal",
];

const NON_RENEWABLE_SOURCES: [&str; 4] = ["Lignite", "Hard Coal", "Other fossil fuel", "Oil"];

static CATEGORY_TABLE: Lazy<HashMap<&'static str, Category>> = Lazy::new(|| {
    RENEWABLE_SOURCES
        .iter()
        .map(|label| (*label, Category::Renewable))
        .chain(
            NON_RENEWABLE_SOURCES
                .iter()
                .map(|label| (*label, Category::NonRenewable)),
        )
        .collect()
});

/// Maps a generation-source label to its category. Unknown labels are `Uncategorized`.
pub fn categorize(generation_source: &str) -> Category {
    CATEGORY_TABLE
        .get(generation_source)
        .copied()
        .unwrap_or(Category::Uncategorized)
}

pub fn renewable_sources() -> &'static [&'static str] {
    &RENEWABLE_SOURCES
}

pub fn non_renewable_sources() -> &'static [&'static str] {
    &NON_RENEWABLE_SOURCES
}
