use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(as = u64)]
pub struct ReviewId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(as = u64)]
pub struct ProductId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(as = u64)]
pub struct CategoryId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Zero { kind: &'static str },
    InvalidNumber { kind: &'static str, value: String },
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero { kind } => write!(f, "{kind} must be positive"),
            Self::InvalidNumber { kind, value } => write!(f, "invalid {kind}: {value}"),
        }
    }
}

impl std::error::Error for IdError {}

macro_rules! id_type {
    ($name:ident, $kind:expr) => {
        impl $name {
            pub const KIND: &'static str = $kind;

            pub fn new(value: u64) -> Result<Self, IdError> {
                if value == 0 {
                    return Err(IdError::Zero { kind: Self::KIND });
                }
                Ok(Self(value))
            }

            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s.trim().parse::<u64>().map_err(|_| IdError::InvalidNumber {
                    kind: Self::KIND,
                    value: s.to_string(),
                })?;
                Self::new(value)
            }
        }
    };
}

id_type!(ReviewId, "review id");
id_type!(ProductId, "product id");
id_type!(CategoryId, "category id");

pub fn parse_id_list<T>(value: &str) -> Result<Vec<T>, IdError>
where
    T: FromStr<Err = IdError>,
{
    value
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(T::from_str)
        .collect()
}

pub fn join_ids<T: fmt::Display>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
