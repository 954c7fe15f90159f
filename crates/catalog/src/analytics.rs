//! Stock analytics over an inventory snapshot.
//!
//! Pure, deterministic functions: given the same set of products and
//! manufacturers, every result is identical regardless of the order the
//! store returned them in. Sums run on integer cents; list outputs are sorted.

use std::collections::{BTreeMap, HashMap};

use stockroom_core::{DomainError, DomainResult, Entity, ManufacturerId, Money, ProductId};

use crate::manufacturer::Manufacturer;
use crate::product::Product;

/// Sentinel used in critical-stock rows when manufacturer or contact data is missing.
pub const UNKNOWN: &str = "Unknown";

pub const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 10;
pub const DEFAULT_CRITICAL_STOCK_THRESHOLD: u64 = 5;

/// Low/critical cutoffs (`amount_in_stock < threshold`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StockThresholds {
    pub low: u64,
    pub critical: u64,
}

impl Default for StockThresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_STOCK_THRESHOLD,
            critical: DEFAULT_CRITICAL_STOCK_THRESHOLD,
        }
    }
}

/// Stock value of all products referencing one manufacturer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerStockValue {
    pub manufacturer: Manufacturer,
    pub total_value: Money,
    pub product_count: usize,
}

/// Critical-stock row, projected for restock outreach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalStockEntry {
    pub product_id: ProductId,
    pub name: String,
    pub manufacturer_name: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub amount_in_stock: u64,
}

/// Whole-inventory overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSummary {
    pub product_count: usize,
    pub manufacturer_count: usize,
    pub total_units: u128,
    pub total_value: Money,
    pub low_stock_count: usize,
    pub critical_stock_count: usize,
    pub thresholds: StockThresholds,
}

/// Products and manufacturers read together from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub products: Vec<Product>,
    pub manufacturers: Vec<Manufacturer>,
}

impl InventorySnapshot {
    pub fn new(products: Vec<Product>, manufacturers: Vec<Manufacturer>) -> Self {
        Self { products, manufacturers }
    }

    fn manufacturer_index(&self) -> HashMap<ManufacturerId, &Manufacturer> {
        self.manufacturers.iter().map(|m| (m.id(), m)).collect()
    }

    /// Sum over all products of `price * amount_in_stock`.
    pub fn total_stock_value(&self) -> DomainResult<Money> {
        Money::try_sum(self.products.iter().map(Product::stock_value))
    }

    /// Stock value grouped by manufacturer reference (not by name).
    ///
    /// Products without a manufacturer are not part of any group. Groups are
    /// ordered by manufacturer name, then id.
    pub fn stock_value_by_manufacturer(&self) -> DomainResult<Vec<ManufacturerStockValue>> {
        let index = self.manufacturer_index();
        let mut groups: BTreeMap<ManufacturerId, (Money, usize)> = BTreeMap::new();

        for product in &self.products {
            let Some(manufacturer_id) = product.manufacturer() else {
                continue;
            };
            if !index.contains_key(&manufacturer_id) {
                return Err(DomainError::invariant(format!(
                    "product {} references missing manufacturer {}",
                    product.id(),
                    manufacturer_id
                )));
            }
            let entry = groups.entry(manufacturer_id).or_insert((Money::ZERO, 0));
            entry.0 = entry.0.checked_add(product.stock_value()?)?;
            entry.1 += 1;
        }

        let mut out: Vec<ManufacturerStockValue> = groups
            .into_iter()
            .filter_map(|(id, (total_value, product_count))| {
                index.get(&id).map(|m| ManufacturerStockValue {
                    manufacturer: (*m).clone(),
                    total_value,
                    product_count,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            a.manufacturer
                .name()
                .cmp(b.manufacturer.name())
                .then_with(|| a.manufacturer.id().cmp(&b.manufacturer.id()))
        });
        Ok(out)
    }

    /// Stock value of the products referencing one manufacturer.
    pub fn stock_value_for(&self, manufacturer_id: ManufacturerId) -> DomainResult<Money> {
        if !self.manufacturers.iter().any(|m| m.id() == manufacturer_id) {
            return Err(DomainError::not_found("manufacturer"));
        }
        Money::try_sum(
            self.products
                .iter()
                .filter(|p| p.manufacturer() == Some(manufacturer_id))
                .map(Product::stock_value),
        )
    }

    /// Products with `amount_in_stock < threshold`, ordered by name then id.
    pub fn low_stock(&self, threshold: u64) -> Vec<Product> {
        let mut out: Vec<Product> = self
            .products
            .iter()
            .filter(|p| p.is_below(threshold))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(&b.id())));
        out
    }

    /// Products with `amount_in_stock < threshold`, projected with manufacturer
    /// contact details. Missing data is filled with [`UNKNOWN`], never an error.
    ///
    /// Ordered by stock ascending (most urgent first), then name, then id.
    pub fn critical_stock(&self, threshold: u64) -> Vec<CriticalStockEntry> {
        let index = self.manufacturer_index();
        let mut out: Vec<CriticalStockEntry> = self
            .products
            .iter()
            .filter(|p| p.is_below(threshold))
            .map(|p| {
                let manufacturer = p.manufacturer().and_then(|id| index.get(&id).copied());
                let contact = manufacturer.and_then(Manufacturer::contact);
                CriticalStockEntry {
                    product_id: p.id(),
                    name: p.name().to_string(),
                    manufacturer_name: manufacturer.map_or(UNKNOWN, Manufacturer::name).to_string(),
                    contact_name: contact.map_or(UNKNOWN, |c| c.name()).to_string(),
                    contact_phone: contact.and_then(|c| c.phone()).unwrap_or(UNKNOWN).to_string(),
                    contact_email: contact.map_or(UNKNOWN, |c| c.email()).to_string(),
                    amount_in_stock: p.amount_in_stock(),
                }
            })
            .collect();
        out.sort_by(|a, b| {
            a.amount_in_stock
                .cmp(&b.amount_in_stock)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        out
    }

    /// Manufacturers deduplicated by id (two records sharing a name both stay).
    pub fn manufacturers_by_id(&self) -> Vec<Manufacturer> {
        let unique: BTreeMap<ManufacturerId, &Manufacturer> =
            self.manufacturers.iter().map(|m| (m.id(), m)).collect();
        let mut out: Vec<Manufacturer> = unique.into_values().cloned().collect();
        out.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(&b.id())));
        out
    }

    pub fn summary(&self, thresholds: StockThresholds) -> DomainResult<StockSummary> {
        let total_units = self
            .products
            .iter()
            .try_fold(0u128, |acc, p| acc.checked_add(u128::from(p.amount_in_stock())))
            .ok_or_else(|| DomainError::invariant("stock unit count overflow"))?;

        Ok(StockSummary {
            product_count: self.products.len(),
            manufacturer_count: self.manufacturers_by_id().len(),
            total_units,
            total_value: self.total_stock_value()?,
            low_stock_count: self.products.iter().filter(|p| p.is_below(thresholds.low)).count(),
            critical_stock_count: self
                .products
                .iter()
                .filter(|p| p.is_below(thresholds.critical))
                .count(),
            thresholds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Contact;
    use crate::manufacturer::ManufacturerDraft;
    use crate::product::ProductDraft;
    use chrono::Utc;

    fn manufacturer(name: &str, contact: Option<Contact>) -> Manufacturer {
        let draft = ManufacturerDraft { contact, ..ManufacturerDraft::named(name) };
        Manufacturer::create(ManufacturerId::new(), draft, Utc::now()).unwrap()
    }

    fn product(name: &str, price_cents: u64, stock: u64, manufacturer: Option<&Manufacturer>) -> Product {
        let draft = ProductDraft {
            name: name.to_string(),
            price: Money::from_cents(price_cents),
            amount_in_stock: stock,
            ..ProductDraft::default()
        };
        Product::create(ProductId::new(), draft, manufacturer.map(|m| m.id()), Utc::now()).unwrap()
    }

    #[test]
    fn acme_scenario_groups_into_one_entry() {
        let acme = manufacturer("Acme", None);
        let snapshot = InventorySnapshot::new(
            vec![
                product("A", 1000, 20, Some(&acme)),
                product("B", 500, 1, Some(&acme)),
            ],
            vec![acme.clone()],
        );

        let groups = snapshot.stock_value_by_manufacturer().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].manufacturer.id(), acme.id());
        assert_eq!(groups[0].total_value, Money::from_cents(20_500));
        assert_eq!(groups[0].total_value.as_decimal(), 205.0);
        assert_eq!(groups[0].product_count, 2);
        assert_eq!(snapshot.total_stock_value().unwrap(), Money::from_cents(20_500));
    }

    #[test]
    fn grouping_uses_id_not_name() {
        let first = manufacturer("Twin", None);
        let second = manufacturer("Twin", None);
        let snapshot = InventorySnapshot::new(
            vec![
                product("A", 100, 1, Some(&first)),
                product("B", 100, 2, Some(&second)),
            ],
            vec![first.clone(), second.clone()],
        );

        let groups = snapshot.stock_value_by_manufacturer().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(snapshot.manufacturers_by_id().len(), 2);
    }

    #[test]
    fn unassigned_products_count_in_total_but_not_in_groups() {
        let acme = manufacturer("Acme", None);
        let snapshot = InventorySnapshot::new(
            vec![product("A", 100, 1, Some(&acme)), product("Loose", 100, 3, None)],
            vec![acme],
        );
        assert_eq!(snapshot.total_stock_value().unwrap(), Money::from_cents(400));
        let groups = snapshot.stock_value_by_manufacturer().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].total_value, Money::from_cents(100));
    }

    #[test]
    fn stock_value_for_unknown_manufacturer_is_not_found() {
        let snapshot = InventorySnapshot::default();
        let err = snapshot.stock_value_for(ManufacturerId::new()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn low_stock_is_strictly_below_threshold() {
        let snapshot = InventorySnapshot::new(
            vec![
                product("zero", 1, 0, None),
                product("nine", 1, 9, None),
                product("ten", 1, 10, None),
                product("eleven", 1, 11, None),
            ],
            vec![],
        );
        let names: Vec<_> = snapshot.low_stock(10).iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["nine", "zero"]);
    }

    #[test]
    fn critical_stock_fills_unknown_sentinels() {
        let with_contact = manufacturer(
            "Acme",
            Some(Contact::new("Wile", "wile@acme.example", None).unwrap()),
        );
        let without_contact = manufacturer("Globex", None);
        let snapshot = InventorySnapshot::new(
            vec![
                product("orphan", 1, 0, None),
                product("no-contact", 1, 1, Some(&without_contact)),
                product("no-phone", 1, 2, Some(&with_contact)),
                product("plenty", 1, 50, Some(&with_contact)),
            ],
            vec![with_contact, without_contact],
        );

        let rows = snapshot.critical_stock(5);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].name, "orphan");
        assert_eq!(rows[0].manufacturer_name, UNKNOWN);
        assert_eq!(rows[0].contact_email, UNKNOWN);

        assert_eq!(rows[1].manufacturer_name, "Globex");
        assert_eq!(rows[1].contact_name, UNKNOWN);

        assert_eq!(rows[2].manufacturer_name, "Acme");
        assert_eq!(rows[2].contact_name, "Wile");
        assert_eq!(rows[2].contact_email, "wile@acme.example");
        assert_eq!(rows[2].contact_phone, UNKNOWN);
    }

    #[test]
    fn summary_counts_tiers() {
        let acme = manufacturer("Acme", None);
        let snapshot = InventorySnapshot::new(
            vec![
                product("a", 100, 2, Some(&acme)),
                product("b", 100, 7, Some(&acme)),
                product("c", 100, 30, None),
            ],
            vec![acme],
        );
        let summary = snapshot.summary(StockThresholds::default()).unwrap();
        assert_eq!(summary.product_count, 3);
        assert_eq!(summary.manufacturer_count, 1);
        assert_eq!(summary.total_units, 39);
        assert_eq!(summary.total_value, Money::from_cents(3900));
        assert_eq!(summary.low_stock_count, 2);
        assert_eq!(summary.critical_stock_count, 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_rows() -> impl Strategy<Value = Vec<(u64, u64, usize)>> {
            // (price cents, stock, manufacturer slot)
            prop::collection::vec((0u64..1_000_000, 0u64..10_000, 0usize..4), 0..40)
        }

        fn build(rows: &[(u64, u64, usize)]) -> InventorySnapshot {
            let manufacturers: Vec<Manufacturer> =
                (0..3).map(|i| manufacturer(&format!("M{i}"), None)).collect();
            let products = rows
                .iter()
                .enumerate()
                .map(|(i, (price, stock, slot))| {
                    product(&format!("p{i}"), *price, *stock, manufacturers.get(*slot))
                })
                .collect();
            InventorySnapshot::new(products, manufacturers)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: aggregation does not depend on product iteration order.
            #[test]
            fn aggregation_is_order_independent(rows in arb_rows(), seed in any::<u64>()) {
                let snapshot = build(&rows);
                let mut shuffled = snapshot.clone();
                let len = shuffled.products.len();
                if len > 1 {
                    let k = (seed as usize) % len;
                    shuffled.products.rotate_left(k);
                    shuffled.products.reverse();
                }
                shuffled.manufacturers.reverse();

                prop_assert_eq!(snapshot.total_stock_value().unwrap(), shuffled.total_stock_value().unwrap());
                prop_assert_eq!(
                    snapshot.stock_value_by_manufacturer().unwrap(),
                    shuffled.stock_value_by_manufacturer().unwrap()
                );
                prop_assert_eq!(snapshot.low_stock(10), shuffled.low_stock(10));
                prop_assert_eq!(snapshot.critical_stock(5), shuffled.critical_stock(5));
            }

            /// Property: the total equals the plain sum of price * stock.
            #[test]
            fn total_matches_row_sum(rows in arb_rows()) {
                let snapshot = build(&rows);
                let expected: u128 = rows.iter().map(|(price, stock, _)| u128::from(price * stock)).sum();
                prop_assert_eq!(snapshot.total_stock_value().unwrap().cents(), expected);
            }

            /// Property: the critical tier is a subset of the low tier.
            #[test]
            fn critical_is_subset_of_low(rows in arb_rows()) {
                let snapshot = build(&rows);
                let low: Vec<ProductId> = snapshot.low_stock(10).iter().map(|p| p.id()).collect();
                for row in snapshot.critical_stock(5) {
                    prop_assert!(low.contains(&row.product_id));
                }
            }

            /// Property: group totals add up to the value of assigned products.
            #[test]
            fn groups_sum_to_assigned_total(rows in arb_rows()) {
                let snapshot = build(&rows);
                let grouped: u128 = snapshot
                    .stock_value_by_manufacturer()
                    .unwrap()
                    .iter()
                    .map(|g| g.total_value.cents())
                    .sum();
                let assigned: u128 = rows
                    .iter()
                    .filter(|(_, _, slot)| *slot < 3)
                    .map(|(price, stock, _)| u128::from(price * stock))
                    .sum();
                prop_assert_eq!(grouped, assigned);
            }
        }
    }
}
