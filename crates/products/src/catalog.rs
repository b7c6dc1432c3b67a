use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{DomainError, DomainResult, ProductId, find_by_id, find_by_id_mut};

use crate::product::{NewProduct, Product};

/// The full product list as persisted under the `products` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn into_inner(self) -> Vec<Product> {
        self.products
    }

    pub fn all(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        find_by_id(&self.products, id)
    }

    /// Like [`ProductCatalog::get`] but hides archived products.
    pub fn get_active(&self, id: &ProductId) -> Option<&Product> {
        self.get(id).filter(|p| p.is_active())
    }

    pub fn active(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_active())
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.active()
            .filter(move |p| p.category().eq_ignore_ascii_case(category))
    }

    /// Case-insensitive substring match on name or HSN code.
    pub fn search(&self, needle: &str) -> Vec<&Product> {
        let needle = needle.to_lowercase();
        self.active()
            .filter(|p| p.name().to_lowercase().contains(&needle) || p.hsn_code().contains(&needle))
            .collect()
    }

    pub fn add(&mut self, id: ProductId, input: NewProduct) -> DomainResult<&Product> {
        if self.get(&id).is_some() {
            return Err(DomainError::invariant(format!("product {id} already exists")));
        }
        let product = Product::create(id, input)?;
        self.products.push(product);
        let last = self.products.len() - 1;
        Ok(&self.products[last])
    }

    pub fn archive(&mut self, id: &ProductId, at: DateTime<Utc>) -> DomainResult<()> {
        let product = find_by_id_mut(&mut self.products, id)
            .ok_or_else(|| DomainError::not_found("product", id))?;
        product.archive(at);
        Ok(())
    }

    pub fn reprice(
        &mut self,
        id: &ProductId,
        cost_price: i64,
        mrp: i64,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let product = find_by_id_mut(&mut self.products, id)
            .ok_or_else(|| DomainError::not_found("product", id))?;
        product.reprice(cost_price, mrp, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pharmaledger_core::BasisPoints;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn tablet(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            category: "Tablet".to_string(),
            cost_price: 4_500,
            mrp: 6_800,
            tax_rate: BasisPoints::percent(12),
            hsn_code: "30049099".to_string(),
            manufacturer: None,
            pack_size: "10x10".to_string(),
            min_stock_level: None,
            max_stock_level: None,
            occurred_at: test_time(),
        }
    }

    #[test]
    fn archived_products_drop_out_of_active_queries() {
        let mut catalog = ProductCatalog::default();
        catalog.add(ProductId::from_raw("P1"), tablet("Sanzyme")).unwrap();
        catalog.add(ProductId::from_raw("P2"), tablet("Sanflox")).unwrap();

        catalog.archive(&ProductId::from_raw("P1"), test_time()).unwrap();

        assert!(catalog.get(&ProductId::from_raw("P1")).is_some());
        assert!(catalog.get_active(&ProductId::from_raw("P1")).is_none());
        assert_eq!(catalog.active().count(), 1);
        assert_eq!(catalog.search("san").len(), 1);
        assert_eq!(catalog.by_category("tablet").count(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut catalog = ProductCatalog::default();
        catalog.add(ProductId::from_raw("P1"), tablet("A")).unwrap();
        assert!(catalog.add(ProductId::from_raw("P1"), tablet("B")).is_err());
    }

    #[test]
    fn archiving_unknown_product_is_not_found() {
        let mut catalog = ProductCatalog::default();
        match catalog.archive(&ProductId::from_raw("nope"), test_time()) {
            Err(DomainError::NotFound { entity: "product", .. }) => {}
            other => panic!("expected not found, got {other:?}"),
        }
    }
}
