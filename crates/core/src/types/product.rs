//! Product listing records.
//!
//! The product API returns loosely shaped listings. [`normalize_product`] maps
//! one listing onto the [`Product`] shape every storefront view renders, and
//! [`unwrap_list`] finds the listing array inside whichever envelope the API
//! happened to use.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::coerce::{
    Path, finite_or, first_array, first_defined, first_truthy, is_truthy, scalar_string,
};
use crate::types::id::ProductId;
use crate::types::price::PriceUnitPolicy;

/// Image shown when a listing carries none.
pub const PLACEHOLDER_IMAGE: &str = "assets/img/products/product-1.png";

/// Brand shown when a listing carries none.
pub const DEFAULT_BRAND: &str = "HayzeeOnline";

/// Category and product type shown when a listing carries none.
pub const DEFAULT_CATEGORY: &str = "Supplement";

/// Rating shown when a listing carries none.
pub const DEFAULT_RATING: f64 = 4.5;

/// Descriptive details block of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    /// Product type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Expiry date as free text.
    pub xpd: String,
    /// Country of origin.
    pub country_of_origin: String,
}

/// Raw API values kept alongside the normalized product for the admin
/// console.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductApiInfo {
    /// Price exactly as the API sent it, before unit conversion.
    pub price_raw: f64,
    /// Availability flag as sent.
    pub availability: Option<Value>,
    /// Resolved primary image.
    pub image: String,
    /// The untouched listing.
    pub raw: Value,
}

/// A normalized product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    /// Price in display units (see [`PriceUnitPolicy`]).
    pub price: f64,
    pub discount_label: String,
    pub rating: f64,
    pub reviews_count: f64,
    pub images: Vec<String>,
    pub thumbnail: String,
    pub sku: String,
    pub brand: String,
    pub short_description: String,
    pub description: String,
    pub details: ProductDetails,
    pub api: ProductApiInfo,
}

impl Product {
    /// Whether the listing is shown to shoppers. Listings that never said
    /// otherwise are available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        match &self.api.availability {
            None | Some(Value::Null) => true,
            Some(v) => is_truthy(v),
        }
    }

    /// Thumbnail, else the first image, else the placeholder.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        if !self.thumbnail.is_empty() {
            return &self.thumbnail;
        }
        self.images
            .first()
            .map_or(PLACEHOLDER_IMAGE, String::as_str)
    }
}

fn text(raw: &Value, candidates: &[Path<'_>], fallback: &str) -> String {
    scalar_string(first_defined(raw, candidates)).unwrap_or_else(|| fallback.to_string())
}

/// Resolve the primary image of a listing.
///
/// Direct fields are probed first (`image`, `thumbnail`, `photo_url`,
/// `image_url`), then the first entry of `images`, then the placeholder.
fn primary_image(raw: &Value) -> String {
    first_truthy(
        raw,
        &[&["image"], &["thumbnail"], &["photo_url"], &["image_url"]],
    )
    .and_then(|v| scalar_string(Some(v)))
    .or_else(|| {
        raw.get("images")
            .and_then(Value::as_array)
            .and_then(|images| images.first())
            .and_then(|v| scalar_string(Some(v)))
    })
    .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}

/// Map one API listing onto a [`Product`].
///
/// Never fails. A listing without any usable id yields a product whose id is
/// empty; callers drop those.
#[must_use]
pub fn normalize_product(raw: &Value, policy: PriceUnitPolicy) -> Product {
    let id = text(raw, &[&["id"], &["product_id"], &["uuid"]], "");
    let image = primary_image(raw);
    let price_raw = finite_or(raw.get("price"), 0.0);

    let images = raw
        .get("images")
        .and_then(Value::as_array)
        .filter(|images| !images.is_empty())
        .map_or_else(
            || vec![image.clone()],
            |images| {
                images
                    .iter()
                    .filter_map(|v| scalar_string(Some(v)))
                    .collect()
            },
        );

    Product {
        id: ProductId::new(id),
        name: text(raw, &[&["name"], &["title"]], "Product"),
        category: text(raw, &[&["category"], &["category_name"]], DEFAULT_CATEGORY),
        price: policy.display_price(price_raw),
        discount_label: text(raw, &[&["discountLabel"]], ""),
        rating: finite_or(raw.get("rating"), DEFAULT_RATING),
        reviews_count: finite_or(first_defined(raw, &[&["reviewsCount"], &["reviews"]]), 0.0),
        images,
        thumbnail: text(raw, &[&["thumbnail"]], &image),
        sku: text(raw, &[&["sku"], &["id"]], ""),
        brand: text(raw, &[&["brand"]], DEFAULT_BRAND),
        short_description: text(
            raw,
            &[&["shortDescription"], &["short_description"], &["description"]],
            "",
        ),
        description: text(raw, &[&["description"]], ""),
        details: ProductDetails {
            kind: text(raw, &[&["details", "type"]], DEFAULT_CATEGORY),
            xpd: text(raw, &[&["details", "xpd"]], ""),
            country_of_origin: text(raw, &[&["details", "countryOfOrigin"]], ""),
        },
        api: ProductApiInfo {
            price_raw,
            availability: raw.get("availability").cloned(),
            image,
            raw: raw.clone(),
        },
    }
}

/// Candidate locations of the listing array, in priority order. The root
/// itself is checked before these.
pub const LIST_CANDIDATES: [Path<'static>; 4] =
    [&["data"], &["items"], &["products", "data"], &["data", "data"]];

/// Find the listing array in a products response.
///
/// Accepts a bare array, `{data: [...]}`, `{items: [...]}`,
/// `{products: {data: [...]}}` and `{data: {data: [...]}}`. Anything else
/// yields an empty slice.
#[must_use]
pub fn unwrap_list(response: &Value) -> &[Value] {
    if let Some(list) = response.as_array() {
        return list;
    }
    first_array(response, &LIST_CANDIDATES).map_or(&[], Vec::as_slice)
}

/// Normalize every listing in a response, dropping those without an id.
#[must_use]
pub fn normalize_products(response: &Value, policy: PriceUnitPolicy) -> Vec<Product> {
    unwrap_list(response)
        .iter()
        .map(|raw| normalize_product(raw, policy))
        .filter(|p| !p.id.is_empty())
        .collect()
}

/// Built-in listing used when the product API is unreachable.
#[must_use]
pub fn sample_products_response() -> Value {
    json!({
        "data": [
            {
                "id": 1,
                "name": "Vitamin D3 5000IU",
                "description": "Bone + immune support (90 softgels)",
                "price": 9800,
                "availability": 1,
                "image": PLACEHOLDER_IMAGE,
                "created_at": "2026-02-23T00:00:00Z",
                "updated_at": "2026-02-23T00:00:00Z"
            },
            {
                "id": 2,
                "name": "Omega-3 Fish Oil 2000mg",
                "description": "Heart + brain support (60 capsules)",
                "price": 14500,
                "availability": 1,
                "image": PLACEHOLDER_IMAGE,
                "created_at": "2026-02-23T00:00:00Z",
                "updated_at": "2026-02-23T00:00:00Z"
            }
        ],
        "meta": { "rows": 20 }
    })
}
