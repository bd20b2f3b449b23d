//! Category Model

use serde::{Deserialize, Serialize};

/// Category aggregate: a `GROUP BY` projection of `products.category`.
///
/// Categories are free text on the product row; there is no category table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}
