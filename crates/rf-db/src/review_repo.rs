use crate::util::{
    DbError, decode_json, encode_json, from_sql_id, from_timestamp, storage, to_sql_id,
    to_timestamp,
};
use rf_core::error::StoreError;
use rf_core::reviews::ReviewRepository;
use rf_core::types::enums::{Order, OrderBy};
use rf_core::types::ids::{ProductId, ReviewId};
use rf_core::types::query::FeedQuery;
use rf_core::types::review::{NewReview, ProductImage, Review, ReviewPage};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params_from_iter};
use std::collections::BTreeMap;

const REVIEW_COLUMNS: &str = "id, product_id, product_name, product_permalink, product_image, reviewer, review, rating, verified, date_created, date_created_gmt, reviewer_avatar_urls";

pub const DATE_DISPLAY_FORMAT: &str = "%B %-d, %Y";

pub struct ReviewRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ReviewRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn assign_categories(&self, input: &NewReview) -> Result<(), StoreError> {
        for category in &input.category_ids {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO product_categories (product_id, category_id) VALUES (?1, ?2)",
                    (
                        to_sql_id(input.product_id.get()),
                        to_sql_id(category.get()),
                    ),
                )
                .map_err(storage)?;
        }
        Ok(())
    }
}

fn validate(input: &NewReview) -> Result<(), StoreError> {
    if input.reviewer.trim().is_empty() {
        return Err(StoreError::InvalidInput {
            message: "reviewer must not be empty".to_string(),
        });
    }
    if input.product_name.trim().is_empty() {
        return Err(StoreError::InvalidInput {
            message: "product_name must not be empty".to_string(),
        });
    }
    if input.rating.is_some_and(|rating| rating > 5) {
        return Err(StoreError::InvalidInput {
            message: "rating must be between 0 and 5".to_string(),
        });
    }
    Ok(())
}

fn filter_clause(query: &FeedQuery) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    if let Some(product_id) = query.product_id {
        clauses.push("product_id = ?".to_string());
        values.push(Value::Integer(to_sql_id(product_id.get())));
    }
    if !query.category_ids.is_empty() {
        let placeholders = vec!["?"; query.category_ids.len()].join(", ");
        clauses.push(format!(
            "product_id IN (SELECT product_id FROM product_categories WHERE category_id IN ({placeholders}))"
        ));
        values.extend(
            query
                .category_ids
                .iter()
                .map(|id| Value::Integer(to_sql_id(id.get()))),
        );
    }
    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

fn order_clause(query: &FeedQuery) -> String {
    let direction = match query.order {
        Order::Asc => "ASC",
        Order::Desc => "DESC",
    };
    match query.orderby {
        OrderBy::DateGmt => format!(" ORDER BY date_created_gmt {direction}, id {direction}"),
        OrderBy::Rating => format!(
            " ORDER BY COALESCE(rating, 0) {direction}, date_created_gmt DESC, id DESC"
        ),
    }
}

impl ReviewRepository for ReviewRepo<'_> {
    fn insert(&self, input: NewReview) -> Result<Review, StoreError> {
        validate(&input)?;
        let product_image = input.product_image.as_ref().map(encode_json).transpose()?;
        let avatars = encode_json(&input.reviewer_avatar_urls)?;
        let created = to_timestamp(&input.date_created_gmt);

        let sql = "INSERT INTO reviews (product_id, product_name, product_permalink, product_image, reviewer, review, rating, verified, date_created, date_created_gmt, reviewer_avatar_urls) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";
        let params = (
            to_sql_id(input.product_id.get()),
            input.product_name.as_str(),
            input.product_permalink.as_str(),
            product_image,
            input.reviewer.as_str(),
            input.review.as_str(),
            input.rating,
            input.verified,
            created.as_str(),
            created.as_str(),
            avatars,
        );
        self.conn.execute(sql, params).map_err(storage)?;
        let rowid = self.conn.last_insert_rowid();
        let id = ReviewId::new(from_sql_id(rowid)?).map_err(|_| DbError::InvalidId { value: rowid })?;
        self.assign_categories(&input)?;

        tracing::debug!(%id, product_id = %input.product_id, "inserted review");
        self.get(id)?.ok_or(StoreError::ReviewNotFound)
    }

    fn get(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"))
            .map_err(storage)?;
        let mut rows = stmt.query([to_sql_id(id.get())]).map_err(storage)?;
        let Some(row) = rows.next().map_err(storage)? else {
            return Ok(None);
        };
        map_review_row(row).map(Some)
    }

    fn list(&self, query: &FeedQuery) -> Result<ReviewPage, StoreError> {
        let (filter, mut values) = filter_clause(query);

        let total: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM reviews{filter}"),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )
            .map_err(storage)?;

        values.push(Value::Integer(to_sql_id(query.per_page as u64)));
        values.push(Value::Integer(to_sql_id(query.offset as u64)));
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews{filter}{} LIMIT ? OFFSET ?",
            order_clause(query)
        );
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = stmt.query(params_from_iter(values.iter())).map_err(storage)?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            reviews.push(map_review_row(row)?);
        }

        Ok(ReviewPage {
            reviews,
            total: usize::try_from(total).unwrap_or(0),
        })
    }

    fn delete(&self, id: ReviewId) -> Result<(), StoreError> {
        let affected = self
            .conn
            .execute("DELETE FROM reviews WHERE id = ?1", [to_sql_id(id.get())])
            .map_err(storage)?;
        if affected == 0 {
            return Err(StoreError::ReviewNotFound);
        }
        Ok(())
    }
}

fn map_review_row(row: &Row<'_>) -> Result<Review, StoreError> {
    let id: i64 = row.get(0).map_err(storage)?;
    let product_id: i64 = row.get(1).map_err(storage)?;
    let product_image: Option<String> = row.get(4).map_err(storage)?;
    let date_created: String = row.get(9).map_err(storage)?;
    let date_created_gmt: String = row.get(10).map_err(storage)?;
    let avatars: String = row.get(11).map_err(storage)?;

    let date_created = from_timestamp(&date_created)?;
    let product_image: Option<ProductImage> =
        product_image.as_deref().map(decode_json).transpose()?;
    let reviewer_avatar_urls: BTreeMap<String, String> = decode_json(&avatars)?;

    Ok(Review {
        id: ReviewId::new(from_sql_id(id)?).map_err(|_| DbError::InvalidId { value: id })?,
        formatted_date_created: date_created.format(DATE_DISPLAY_FORMAT).to_string(),
        date_created,
        date_created_gmt: from_timestamp(&date_created_gmt)?,
        product_id: ProductId::new(from_sql_id(product_id)?)
            .map_err(|_| DbError::InvalidId { value: product_id })?,
        product_name: row.get(2).map_err(storage)?,
        product_permalink: row.get(3).map_err(storage)?,
        product_image,
        reviewer: row.get(5).map_err(storage)?,
        review: row.get(6).map_err(storage)?,
        rating: row.get(7).map_err(storage)?,
        verified: row.get(8).map_err(storage)?,
        reviewer_avatar_urls,
    })
}
