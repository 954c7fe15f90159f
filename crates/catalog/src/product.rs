use chrono::{DateTime, Utc};

use stockroom_core::{DomainError, DomainResult, Entity, FieldUpdate, ManufacturerId, Money, ProductId};

use crate::manufacturer::ManufacturerInput;

/// Input for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Money,
    pub category: Option<String>,
    pub amount_in_stock: u64,
}

impl ProductDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(())
    }
}

/// Product create request: the draft plus an unresolved manufacturer reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProduct {
    pub draft: ProductDraft,
    pub manufacturer: Option<ManufacturerInput>,
}

/// Partial product update. Only `Set`/`Clear` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: FieldUpdate<String>,
    pub sku: FieldUpdate<String>,
    pub description: FieldUpdate<String>,
    pub price: FieldUpdate<Money>,
    pub category: FieldUpdate<String>,
    pub amount_in_stock: FieldUpdate<u64>,
}

impl ProductChanges {
    pub fn validate(&self) -> DomainResult<()> {
        match &self.name {
            FieldUpdate::Clear => return Err(DomainError::validation("product name cannot be cleared")),
            FieldUpdate::Set(name) if name.trim().is_empty() => {
                return Err(DomainError::validation("product name cannot be empty"));
            }
            _ => {}
        }
        if self.price == FieldUpdate::Clear {
            return Err(DomainError::validation("product price cannot be cleared"));
        }
        if self.amount_in_stock == FieldUpdate::Clear {
            return Err(DomainError::validation("amountInStock cannot be cleared"));
        }
        Ok(())
    }
}

/// Product update request: field changes plus an unresolved manufacturer change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductUpdate {
    pub changes: ProductChanges,
    pub manufacturer: FieldUpdate<ManufacturerInput>,
}

/// Product entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    name: String,
    sku: Option<String>,
    description: Option<String>,
    price: Money,
    category: Option<String>,
    amount_in_stock: u64,
    manufacturer: Option<ManufacturerId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    pub fn create(
        id: ProductId,
        draft: ProductDraft,
        manufacturer: Option<ManufacturerId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        draft.validate()?;
        let product = Self::restore(id, draft, manufacturer, now, now);
        product.check_value_bounds()?;
        Ok(product)
    }

    /// Rebuild a previously validated record (store rehydration).
    pub fn restore(
        id: ProductId,
        draft: ProductDraft,
        manufacturer: Option<ManufacturerId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            sku: draft.sku,
            description: draft.description,
            price: draft.price,
            category: draft.category,
            amount_in_stock: draft.amount_in_stock,
            manufacturer,
            created_at,
            updated_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn amount_in_stock(&self) -> u64 {
        self.amount_in_stock
    }

    pub fn manufacturer(&self) -> Option<ManufacturerId> {
        self.manufacturer
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// `price * amount_in_stock`.
    pub fn stock_value(&self) -> DomainResult<Money> {
        self.price.times(self.amount_in_stock)
    }

    /// Largest stock count, matching a signed 64-bit database column.
    pub const MAX_STOCK: u64 = i64::MAX as u64;

    /// Price and stock value must each fit [`Money::MAX_CENTS`], so every
    /// stored product has a well-defined stock value.
    fn check_value_bounds(&self) -> DomainResult<()> {
        if self.amount_in_stock > Self::MAX_STOCK {
            return Err(DomainError::validation("amountInStock is too large"));
        }
        self.price.ensure_bounded("price")?;
        self.stock_value()
            .map_err(|_| DomainError::validation("stock value (price * amountInStock) is too large"))?
            .ensure_bounded("stock value (price * amountInStock)")?;
        Ok(())
    }

    pub fn is_below(&self, threshold: u64) -> bool {
        self.amount_in_stock < threshold
    }

    /// Apply a partial update. `manufacturer` is the already-resolved reference change.
    pub fn apply_changes(
        &mut self,
        changes: ProductChanges,
        manufacturer: FieldUpdate<ManufacturerId>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        changes.validate()?;

        let mut next = self.clone();
        if let FieldUpdate::Set(name) = changes.name {
            next.name = name.trim().to_string();
        }
        changes.sku.apply_to(&mut next.sku);
        changes.description.apply_to(&mut next.description);
        if let FieldUpdate::Set(price) = changes.price {
            next.price = price;
        }
        changes.category.apply_to(&mut next.category);
        if let FieldUpdate::Set(amount) = changes.amount_in_stock {
            next.amount_in_stock = amount;
        }
        manufacturer.apply_to(&mut next.manufacturer);
        next.check_value_bounds()?;

        next.updated_at = now;
        *self = next;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}
