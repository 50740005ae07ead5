use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    DateGmt,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Reviewer,
    Product,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    General,
    Api,
}

/// Sort option chosen in the UI. Unknown keys are kept verbatim and sort by date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    MostRecent,
    HighestRating,
    LowestRating,
    Other(String),
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl OrderBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DateGmt => "date_gmt",
            Self::Rating => "rating",
        }
    }
}

impl SortKey {
    pub fn as_str(&self) -> &str {
        match self {
            Self::MostRecent => "most-recent",
            Self::HighestRating => "highest-rating",
            Self::LowestRating => "lowest-rating",
            Self::Other(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for Order {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(UnknownVariant {
                kind: "order",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for OrderBy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_gmt" => Ok(Self::DateGmt),
            "rating" => Ok(Self::Rating),
            other => Err(UnknownVariant {
                kind: "orderby",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for ImageType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reviewer" => Ok(Self::Reviewer),
            "product" => Ok(Self::Product),
            other => Err(UnknownVariant {
                kind: "image type",
                value: other.to_string(),
            }),
        }
    }
}

impl From<&str> for SortKey {
    fn from(value: &str) -> Self {
        match value {
            "most-recent" => Self::MostRecent,
            "highest-rating" => Self::HighestRating,
            "lowest-rating" => Self::LowestRating,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SortKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from(value.as_str()))
    }
}
