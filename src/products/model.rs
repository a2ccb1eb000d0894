//! Product records and request payloads.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A stored product row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub price: Decimal,
    pub created_at: Option<NaiveDateTime>,
}

/// Fully specified business fields, ready to insert or write back.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

/// `POST` body. Every field is optional at the wire level so that missing
/// fields produce the service's own 400 message rather than a parser error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProduct {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

impl CreateProduct {
    /// Require every field to be present and truthy: non-empty strings and a
    /// non-zero price. A negative price is never accepted.
    pub fn validate(self) -> Option<NewProduct> {
        let name = self.name.filter(|n| !n.is_empty())?;
        let image = self.image.filter(|i| !i.is_empty())?;
        let price = self.price.filter(|p| p.is_sign_positive() && !p.is_zero())?;
        Some(NewProduct { name, price, image })
    }
}

/// `PUT` body. Each field is `None` when absent, `Some(None)` when sent as
/// `null`, `Some(Some(v))` when sent with a value. Only absence counts
/// against "at least one field"; `null` is present but keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Why a patch was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    Empty,
    Invalid(&'static str),
}

impl ProductPatch {
    /// True when the body named none of the fields.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.image.is_none()
    }

    /// Reject patches that would leave a stored row violating its invariants.
    pub fn check(&self) -> Result<(), PatchError> {
        if self.is_empty() {
            return Err(PatchError::Empty);
        }
        if let Some(Some(name)) = &self.name {
            if name.is_empty() {
                return Err(PatchError::Invalid("Product name must not be empty"));
            }
        }
        if let Some(Some(image)) = &self.image {
            if image.is_empty() {
                return Err(PatchError::Invalid("Product image must not be empty"));
            }
        }
        if let Some(Some(price)) = self.price {
            if price.is_sign_negative() && !price.is_zero() {
                return Err(PatchError::Invalid("Product price must not be negative"));
            }
        }
        Ok(())
    }

    /// Merge against a fetched snapshot: provided fields overwrite, omitted
    /// fields keep the snapshot's values.
    pub fn apply(self, existing: &Product) -> NewProduct {
        NewProduct {
            name: self.name.flatten().unwrap_or_else(|| existing.name.clone()),
            price: self.price.flatten().unwrap_or(existing.price),
            image: self.image.flatten().unwrap_or_else(|| existing.image.clone()),
        }
    }
}
