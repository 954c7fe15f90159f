//! Request DTOs (JSON → domain) and response mapping (domain → JSON).
//!
//! Field names are camelCase on the wire. Prices travel as decimal numbers
//! and are converted to integer cents here.

use serde::Deserialize;
use serde_json::{json, Value};

use stockroom_catalog::{
    Address, Contact, CriticalStockEntry, Manufacturer, ManufacturerChanges, ManufacturerDraft,
    ManufacturerInput, ManufacturerStockValue, NewProduct, Product, ProductChanges, ProductDraft,
    ProductUpdate, StockSummary,
};
use stockroom_core::{DomainError, DomainResult, Entity, FieldUpdate, ManufacturerId, Money};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactRequest {
    pub fn into_contact(self) -> DomainResult<Contact> {
        let email = self
            .email
            .ok_or_else(|| DomainError::validation("contact email is required"))?;
        Contact::new(self.name.unwrap_or_default(), email, self.phone)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerRequest {
    pub name: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub address: Option<Address>,
    pub contact: Option<ContactRequest>,
}

impl ManufacturerRequest {
    pub fn into_draft(self) -> DomainResult<ManufacturerDraft> {
        let name = self
            .name
            .ok_or_else(|| DomainError::validation("manufacturer name is required"))?;
        let draft = ManufacturerDraft {
            name,
            country: self.country,
            website: self.website,
            description: self.description,
            address: self.address,
            contact: self.contact.map(ContactRequest::into_contact).transpose()?,
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// A product's `manufacturer` field: an existing id or embedded details.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ManufacturerRef {
    Id(String),
    Details(ManufacturerRequest),
}

impl ManufacturerRef {
    pub fn into_input(self) -> DomainResult<ManufacturerInput> {
        match self {
            ManufacturerRef::Id(id) => Ok(ManufacturerInput::Existing(id.parse::<ManufacturerId>()?)),
            ManufacturerRef::Details(details) => Ok(ManufacturerInput::Details(details.into_draft()?)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub amount_in_stock: Option<i64>,
    pub manufacturer: Option<ManufacturerRef>,
}

impl CreateProductRequest {
    pub fn into_domain(self) -> DomainResult<NewProduct> {
        let name = self
            .name
            .ok_or_else(|| DomainError::validation("product name is required"))?;
        let price = self
            .price
            .ok_or_else(|| DomainError::validation("product price is required"))?;

        let draft = ProductDraft {
            name,
            sku: self.sku,
            description: self.description,
            price: Money::from_decimal(price)?,
            category: self.category,
            amount_in_stock: self.amount_in_stock.map(stock_amount).transpose()?.unwrap_or(0),
        };
        draft.validate()?;

        Ok(NewProduct {
            draft,
            manufacturer: self.manufacturer.map(ManufacturerRef::into_input).transpose()?,
        })
    }
}

/// Partial product update: absent keys are left unchanged, `null` clears.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: FieldUpdate<String>,
    #[serde(default)]
    pub sku: FieldUpdate<String>,
    #[serde(default)]
    pub description: FieldUpdate<String>,
    #[serde(default)]
    pub price: FieldUpdate<f64>,
    #[serde(default)]
    pub category: FieldUpdate<String>,
    #[serde(default)]
    pub amount_in_stock: FieldUpdate<i64>,
    #[serde(default)]
    pub manufacturer: FieldUpdate<ManufacturerRef>,
}

impl UpdateProductRequest {
    pub fn into_domain(self) -> DomainResult<ProductUpdate> {
        let changes = ProductChanges {
            name: self.name,
            sku: self.sku,
            description: self.description,
            price: self.price.try_map(Money::from_decimal)?,
            category: self.category,
            amount_in_stock: self.amount_in_stock.try_map(stock_amount)?,
        };
        changes.validate()?;

        Ok(ProductUpdate {
            changes,
            manufacturer: self.manufacturer.try_map(ManufacturerRef::into_input)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManufacturerRequest {
    #[serde(default)]
    pub name: FieldUpdate<String>,
    #[serde(default)]
    pub country: FieldUpdate<String>,
    #[serde(default)]
    pub website: FieldUpdate<String>,
    #[serde(default)]
    pub description: FieldUpdate<String>,
    #[serde(default)]
    pub address: FieldUpdate<Address>,
    #[serde(default)]
    pub contact: FieldUpdate<ContactRequest>,
}

impl UpdateManufacturerRequest {
    pub fn into_domain(self) -> DomainResult<ManufacturerChanges> {
        let changes = ManufacturerChanges {
            name: self.name,
            country: self.country,
            website: self.website,
            description: self.description,
            address: self.address,
            contact: self.contact.try_map(ContactRequest::into_contact)?,
        };
        changes.validate()?;
        Ok(changes)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ThresholdQuery {
    pub threshold: Option<i64>,
}

impl ThresholdQuery {
    pub fn threshold(&self) -> DomainResult<Option<u64>> {
        self.threshold
            .map(|t| u64::try_from(t).map_err(|_| DomainError::validation("threshold cannot be negative")))
            .transpose()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

fn stock_amount(amount: i64) -> DomainResult<u64> {
    u64::try_from(amount).map_err(|_| DomainError::validation("amountInStock cannot be negative"))
}

// -------------------------
// Response mapping
// -------------------------

/// Decimal number, convenient for clients. Loses precision above 2^53 cents.
pub fn money_to_json(amount: Money) -> Value {
    json!(amount.as_decimal())
}

/// Exact decimal string (e.g. `"205.00"`), sent next to every amount.
pub fn money_to_exact_json(amount: Money) -> Value {
    Value::String(amount.to_string())
}

pub fn contact_to_json(contact: &Contact) -> Value {
    json!({
        "name": contact.name(),
        "email": contact.email(),
        "phone": contact.phone(),
    })
}

pub fn manufacturer_to_json(m: &Manufacturer) -> Value {
    json!({
        "id": m.id().to_string(),
        "name": m.name(),
        "country": m.country(),
        "website": m.website(),
        "description": m.description(),
        "address": m.address(),
        "contact": m.contact().map(contact_to_json),
        "createdAt": m.created_at(),
        "updatedAt": m.updated_at(),
    })
}

/// Product with its manufacturer embedded (`null` when unassigned).
pub fn product_to_json(p: &Product, manufacturer: Option<&Manufacturer>) -> Value {
    json!({
        "id": p.id().to_string(),
        "name": p.name(),
        "sku": p.sku(),
        "description": p.description(),
        "price": money_to_json(p.price()),
        "priceDecimal": money_to_exact_json(p.price()),
        "category": p.category(),
        "amountInStock": p.amount_in_stock(),
        "manufacturerId": p.manufacturer().map(|id| id.to_string()),
        "manufacturer": manufacturer.map(manufacturer_to_json),
        "stockValue": p.stock_value().ok().map(money_to_json),
        "stockValueDecimal": p.stock_value().ok().map(money_to_exact_json),
        "createdAt": p.created_at(),
        "updatedAt": p.updated_at(),
    })
}

pub fn critical_entry_to_json(e: &CriticalStockEntry) -> Value {
    json!({
        "productId": e.product_id.to_string(),
        "name": e.name,
        "manufacturerName": e.manufacturer_name,
        "contactName": e.contact_name,
        "contactPhone": e.contact_phone,
        "contactEmail": e.contact_email,
        "amountInStock": e.amount_in_stock,
    })
}

pub fn manufacturer_value_to_json(v: &ManufacturerStockValue) -> Value {
    json!({
        "manufacturer": manufacturer_to_json(&v.manufacturer),
        "totalValue": money_to_json(v.total_value),
        "totalValueDecimal": money_to_exact_json(v.total_value),
        "productCount": v.product_count,
    })
}

/// JSON integer when it fits in 64 bits, otherwise the nearest float.
fn count_to_json(count: u128) -> Value {
    match u64::try_from(count) {
        Ok(n) => json!(n),
        Err(_) => json!(count as f64),
    }
}

pub fn summary_to_json(s: &StockSummary) -> Value {
    json!({
        "productCount": s.product_count,
        "manufacturerCount": s.manufacturer_count,
        "totalUnits": count_to_json(s.total_units),
        "totalValue": money_to_json(s.total_value),
        "totalValueDecimal": money_to_exact_json(s.total_value),
        "lowStockCount": s.low_stock_count,
        "criticalStockCount": s.critical_stock_count,
        "lowStockThreshold": s.thresholds.low,
        "criticalStockThreshold": s.thresholds.critical,
    })
}
