use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ProductId};

/// Stock-keeping unit: unique per product, alphanumeric, 3..=20 chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.len() < 3 || value.len() > 20 {
            return Err(DomainError::validation(
                "sku must be between 3 and 20 characters",
            ));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::validation("sku must be alphanumeric"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub sku: Sku,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub category: String,
    pub stock: i64,
    pub description: Option<String>,
}

/// Partial update for a product; `None` fields are left untouched.
///
/// The SKU is deliberately not updatable: it is the stable external key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<u64>,
    pub category: Option<String>,
    pub stock: Option<i64>,
    pub description: Option<String>,
}

/// Catalog record.
///
/// `stock` never goes below zero; `in_stock` is derived (`stock > 0`) and is
/// kept in sync by every mutation on this type. Order-driven stock movement
/// goes through [`Product::reserve`] and [`Product::release`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: Sku,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub category: String,
    pub stock: i64,
    pub in_stock: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(id: ProductId, draft: ProductDraft, created_at: DateTime<Utc>) -> DomainResult<Self> {
        validate_name(&draft.name)?;
        validate_price(draft.price)?;
        validate_category(&draft.category)?;
        validate_stock(draft.stock)?;
        if let Some(description) = &draft.description {
            validate_description(description)?;
        }

        Ok(Self {
            id,
            name: draft.name,
            sku: draft.sku,
            price: draft.price,
            category: draft.category,
            stock: draft.stock,
            in_stock: draft.stock > 0,
            description: draft.description,
            created_at,
        })
    }

    /// Apply a partial update, re-validating every supplied field.
    pub fn apply(&mut self, changes: ProductChanges) -> DomainResult<()> {
        if let Some(name) = changes.name {
            validate_name(&name)?;
            self.name = name;
        }
        if let Some(price) = changes.price {
            validate_price(price)?;
            self.price = price;
        }
        if let Some(category) = changes.category {
            validate_category(&category)?;
            self.category = category;
        }
        if let Some(description) = changes.description {
            validate_description(&description)?;
            self.description = Some(description);
        }
        if let Some(stock) = changes.stock {
            validate_stock(stock)?;
            self.stock = stock;
            self.sync_in_stock();
        }
        Ok(())
    }

    /// Reserve `quantity` units for an order, decrementing stock.
    ///
    /// Fails when the reservation would drive stock below zero; the record is
    /// left untouched on failure.
    pub fn reserve(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if self.stock < quantity {
            return Err(DomainError::invariant("stock cannot go negative"));
        }
        self.stock -= quantity;
        self.sync_in_stock();
        Ok(())
    }

    /// Return `quantity` units to stock (order edited down or deleted).
    ///
    /// Non-positive quantities are ignored.
    pub fn release(&mut self, quantity: i64) {
        if quantity > 0 {
            self.stock += quantity;
            self.sync_in_stock();
        }
    }

    fn sync_in_stock(&mut self) {
        self.in_stock = self.stock > 0;
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    let len = name.trim().chars().count();
    if !(3..=100).contains(&len) {
        return Err(DomainError::validation(
            "name must be between 3 and 100 characters",
        ));
    }
    Ok(())
}

fn validate_price(price: u64) -> DomainResult<()> {
    if price == 0 {
        return Err(DomainError::validation("price must be positive"));
    }
    Ok(())
}

fn validate_category(category: &str) -> DomainResult<()> {
    if category.trim().is_empty() {
        return Err(DomainError::validation("category cannot be empty"));
    }
    Ok(())
}

fn validate_stock(stock: i64) -> DomainResult<()> {
    if stock < 0 {
        return Err(DomainError::validation("stock cannot be negative"));
    }
    Ok(())
}

fn validate_description(description: &str) -> DomainResult<()> {
    let len = description.chars().count();
    if !(5..=500).contains(&len) {
        return Err(DomainError::validation(
            "description must be between 5 and 500 characters",
        ));
    }
    Ok(())
}
