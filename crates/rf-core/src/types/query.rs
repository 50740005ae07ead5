use crate::types::enums::{Order, OrderBy};
use crate::types::ids::{CategoryId, IdError, ProductId, join_ids, parse_id_list};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

pub const REVIEWS_ROUTE: &str = "/wc/store/v1/products/reviews";

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid parameter {param}: {message}")]
    InvalidParam { param: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub order: Order,
    pub orderby: OrderBy,
    pub per_page: usize,
    pub offset: usize,
    pub product_id: Option<ProductId>,
    pub category_ids: Vec<CategoryId>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            order: Order::Desc,
            orderby: OrderBy::DateGmt,
            per_page: DEFAULT_PER_PAGE,
            offset: 0,
            product_id: None,
            category_ids: Vec::new(),
        }
    }
}

impl FeedQuery {
    pub fn to_query_string(&self) -> String {
        let mut parts = vec![
            format!("order={}", self.order.as_str()),
            format!("orderby={}", self.orderby.as_str()),
            format!("per_page={}", self.per_page),
            format!("offset={}", self.offset),
        ];
        if !self.category_ids.is_empty() {
            // Commas stay literal; the endpoint splits on them.
            parts.push(format!("category_id={}", join_ids(&self.category_ids)));
        }
        if let Some(product_id) = self.product_id {
            parts.push(format!("product_id={product_id}"));
        }
        parts.join("&")
    }

    pub fn path(&self) -> String {
        format!("{REVIEWS_ROUTE}?{}", self.to_query_string())
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key {
                "order" => {
                    query.order = Order::from_str(value).map_err(|err| QueryError::InvalidParam {
                        param: "order",
                        message: err.to_string(),
                    })?;
                }
                "orderby" => {
                    query.orderby =
                        OrderBy::from_str(value).map_err(|err| QueryError::InvalidParam {
                            param: "orderby",
                            message: err.to_string(),
                        })?;
                }
                "per_page" => {
                    let per_page = parse_count("per_page", value)?;
                    if per_page > MAX_PER_PAGE {
                        return Err(QueryError::InvalidParam {
                            param: "per_page",
                            message: format!("must be between 0 and {MAX_PER_PAGE}"),
                        });
                    }
                    query.per_page = per_page;
                }
                "offset" => query.offset = parse_count("offset", value)?,
                "product_id" => {
                    let value = value.trim();
                    query.product_id = if value.is_empty() {
                        None
                    } else {
                        Some(ProductId::from_str(value).map_err(|err| id_error("product_id", &err))?)
                    };
                }
                "category_id" => {
                    query.category_ids =
                        parse_id_list(value).map_err(|err| id_error("category_id", &err))?;
                }
                _ => {}
            }
        }
        Ok(query)
    }
}

fn parse_count(param: &'static str, value: &str) -> Result<usize, QueryError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| QueryError::InvalidParam {
            param,
            message: format!("expected a non-negative integer, got {value}"),
        })
}

fn id_error(param: &'static str, err: &IdError) -> QueryError {
    QueryError::InvalidParam {
        param,
        message: err.to_string(),
    }
}

/// `Raw` holds the JSON string from block markup until a query is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelection {
    Ids(Vec<CategoryId>),
    Raw(String),
}

impl CategorySelection {
    pub fn resolve(&self) -> Result<Vec<CategoryId>, String> {
        match self {
            Self::Ids(ids) => Ok(ids.clone()),
            Self::Raw(raw) => {
                let value: Value = serde_json::from_str(raw)
                    .map_err(|err| format!("category ids are not valid JSON: {err}"))?;
                match value {
                    Value::Array(items) => items.iter().map(category_from_value).collect(),
                    Value::String(csv) => parse_id_list(&csv).map_err(|err| err.to_string()),
                    Value::Null => Ok(Vec::new()),
                    other => category_from_value(&other).map(|id| vec![id]),
                }
            }
        }
    }
}

fn category_from_value(value: &Value) -> Result<CategoryId, String> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .ok_or_else(|| format!("invalid category id: {number}"))
            .and_then(|id| CategoryId::new(id).map_err(|err| err.to_string())),
        Value::String(text) => CategoryId::from_str(text).map_err(|err| err.to_string()),
        other => Err(format!("invalid category id: {other}")),
    }
}
