use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product that was detected in stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAlert {
    pub product: String,
    pub retailer: String,
    pub url: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default = "Utc::now")]
    pub detected_at: DateTime<Utc>,
}

impl StockAlert {
    pub fn new(product: impl Into<String>, retailer: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            retailer: retailer.into(),
            url: url.into(),
            price: None,
            image_url: None,
            sku: None,
            detected_at: Utc::now(),
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }
}
