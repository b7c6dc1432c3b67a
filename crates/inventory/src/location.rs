use serde::{Deserialize, Serialize};

/// A tier of the distribution chain where stock can sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Warehouse,
    Superstockist,
    Stockist,
    Retailer,
}

impl Location {
    pub const ALL: [Location; 4] = [
        Location::Warehouse,
        Location::Superstockist,
        Location::Stockist,
        Location::Retailer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Location::Warehouse => "warehouse",
            Location::Superstockist => "superstockist",
            Location::Stockist => "stockist",
            Location::Retailer => "retailer",
        }
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
