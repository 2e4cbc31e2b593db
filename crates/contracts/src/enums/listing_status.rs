use serde::{Deserialize, Serialize};

/// Sale state of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Sold,
}

impl ListingStatus {
    /// Stored code of the status
    pub fn code(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
        }
    }

    /// Parse from the stored code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "active" => Some(ListingStatus::Active),
            "sold" => Some(ListingStatus::Sold),
            _ => None,
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
