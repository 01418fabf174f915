//! JSON projections of backend resources.
//!
//! These are read-only views; the backend owns the data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An item we sell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Price for one item in cents.
    pub cost: i64,
    /// Original number of items available.
    pub quantity: i64,
    pub sold: i64,
    /// Total cost of sold items in cents.
    pub revenue: i64,
    /// ID of the user who created the product.
    pub user_id: String,
    pub date_created: Option<DateTime<Utc>>,
    pub date_updated: Option<DateTime<Utc>>,
}

/// Someone with access to the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub date_created: Option<DateTime<Utc>>,
    pub date_updated: Option<DateTime<Utc>>,
}

/// Body of a successful `GET /users/token`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_decodes_backend_payload() {
        let product: Product = serde_json::from_str(
            r#"{
                "id": "72f8b983-3eb4-48db-9ed0-e45cc6bd716b",
                "name": "McDonalds Toys",
                "cost": 75,
                "quantity": 120,
                "sold": 3,
                "revenue": 225,
                "user_id": "45b5fbd3-755f-4379-8f07-a58d4a30fa2f",
                "date_created": "2019-03-24T00:00:00Z",
                "date_updated": "2019-03-24T00:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(product.name, "McDonalds Toys");
        assert_eq!(product.revenue, 225);
        assert_eq!(
            product.date_created.unwrap().to_rfc3339(),
            "2019-03-24T00:00:00+00:00"
        );
    }

    #[test]
    fn missing_timestamps_are_none() {
        let user: User = serde_json::from_str(r#"{"id":"u1","name":"User Gopher"}"#).unwrap();
        assert_eq!(user.email, "");
        assert!(user.date_created.is_none());
    }
}
