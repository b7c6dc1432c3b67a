//! Integration tests for the service layer over real storage backends.
//!
//! Tests: Service → UnitOfWork → KeyValueStore → reload
//!
//! Verifies:
//! - Invoices move stock between locations and log movements
//! - A failed rule or a failed write leaves storage untouched
//! - Loan payments and the payment log are persisted together

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use pharmaledger_accounting::{
    InterestFrequency, LoanStatus, NewPersonalLoan, PaymentRequest, PrincipalRepayment,
};
use pharmaledger_core::{BasisPoints, DistributorId, DomainError, Entity, ProductId};
use pharmaledger_inventory::{
    Location, MovementLog, MovementType, StockBook, StockUpdate, Transfer,
};
use pharmaledger_invoicing::{
    InvoiceBook, InvoiceFilter, InvoiceKind, InvoiceLine, InvoiceRequest, InvoiceStatus,
};
use pharmaledger_parties::{DistributorKind, NewDistributor};
use pharmaledger_products::NewProduct;

use crate::namespace::Namespace;
use crate::seed::load_sample_data;
use crate::services::{Outcome, ServiceError, Services};
use crate::store::{InMemoryStore, JsonFileStore, KeyValueStore, StoreError};
use crate::unit_of_work::Storage;

fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Wraps an in-memory store and fails writes to one key on demand.
#[derive(Default)]
struct FailingStore {
    inner: InMemoryStore,
    fail_on: Mutex<Option<String>>,
}

impl FailingStore {
    fn fail_writes_to(&self, key: &str) {
        *self.fail_on.lock().unwrap() = Some(key.to_string());
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_on.lock().unwrap().as_deref() == Some(key) {
            return Err(StoreError::Rejected(format!("simulated failure on {key}")));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.keys()
    }
}

fn add_product<S: KeyValueStore>(services: &Services<S>) -> ProductId {
    services
        .catalog
        .add(NewProduct {
            name: "SAZ LQ10".to_string(),
            category: "Syrup".to_string(),
            cost_price: 12_000,
            mrp: 18_000,
            tax_rate: BasisPoints::percent(12),
            hsn_code: "30049099".to_string(),
            manufacturer: None,
            pack_size: "100ml".to_string(),
            min_stock_level: None,
            max_stock_level: None,
            occurred_at: test_time(),
        })
        .unwrap()
        .id()
        .clone()
}

fn receive<S: KeyValueStore>(services: &Services<S>, product: &ProductId, at: Location, quantity: i64) {
    services
        .stock
        .update_stock(StockUpdate::new(
            product.clone(),
            at,
            quantity,
            MovementType::Purchase,
            test_time(),
        ))
        .unwrap();
}

fn line(product: &ProductId, quantity: i64, scheme: &str) -> InvoiceLine {
    InvoiceLine {
        product_id: product.to_string(),
        product_name: String::new(),
        hsn_code: String::new(),
        quantity,
        rate: 15_000,
        discount: BasisPoints::ZERO,
        tax_rate: BasisPoints::percent(12),
        bonus_scheme: scheme.to_string(),
    }
}

fn request(lines: Vec<InvoiceLine>) -> InvoiceRequest {
    InvoiceRequest {
        date: date(2024, 3, 1),
        from_party: "DIST001".to_string(),
        to_party: "City Medicals".to_string(),
        items: lines,
        payment_terms: Some("30 days".to_string()),
        notes: String::new(),
    }
}

#[test]
fn stockist_invoice_moves_stock_to_retailer_with_bonus() {
    let services = Services::new(InMemoryStore::new());
    let product = add_product(&services);
    receive(&services, &product, Location::Stockist, 100);

    let invoice = services
        .invoices
        .create_invoice(InvoiceKind::Stockist, request(vec![line(&product, 20, "10+1")]), test_time())
        .unwrap();

    assert_eq!(invoice.invoice_number(), "ST24030001");
    assert_eq!(invoice.items()[0].product_name(), "SAZ LQ10");
    assert_eq!(invoice.items()[0].hsn_code(), "30049099");
    assert_eq!(invoice.items()[0].bonus_quantity(), 2);

    assert_eq!(services.stock.stock_level(&product, Some(Location::Stockist)).unwrap(), 80);
    assert_eq!(services.stock.stock_level(&product, Some(Location::Retailer)).unwrap(), 22);

    let movements = services
        .stock
        .movements_for_reference(invoice.id().as_str())
        .unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].movement_type, MovementType::Sale);
    assert_eq!(movements[0].from_location, Some(Location::Stockist));
    assert_eq!(movements[1].movement_type, MovementType::Purchase);
    assert_eq!(movements[1].to_location, Some(Location::Retailer));
    assert_eq!(movements[1].quantity, 22);

    let retailer = services.stock.items_by_location(Location::Retailer).unwrap();
    assert_eq!(retailer[0].product_name(), "SAZ LQ10");
    assert_eq!(retailer[0].mrp(), 18_000);
}

#[test]
fn warehouse_purchase_then_transfer_to_stockist() {
    let services = Services::new(InMemoryStore::new());
    let product = add_product(&services);
    receive(&services, &product, Location::Warehouse, 50);

    let movement = services
        .stock
        .transfer_stock(Transfer {
            product_id: product.clone(),
            from: Location::Warehouse,
            to: Location::Stockist,
            quantity: 20,
            reference: None,
            occurred_at: test_time(),
        })
        .unwrap();
    assert_eq!(movement.movement_type, MovementType::Transfer);
    assert_eq!(movement.from_location, Some(Location::Warehouse));
    assert_eq!(movement.to_location, Some(Location::Stockist));

    assert_eq!(services.stock.stock_level(&product, Some(Location::Warehouse)).unwrap(), 30);
    assert_eq!(services.stock.stock_level(&product, Some(Location::Stockist)).unwrap(), 20);
    assert_eq!(services.stock.stock_level(&product, None).unwrap(), 50);

    let movements = services.stock.movements_for(&product).unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].movement_type, MovementType::Purchase);
    assert_eq!(movements[1].movement_type, MovementType::Transfer);

    // the destination record inherits catalog details from the source
    let stockist = services.stock.items_by_location(Location::Stockist).unwrap();
    assert_eq!(stockist[0].product_name(), "SAZ LQ10");

    let err = services
        .stock
        .transfer_stock(Transfer {
            product_id: product.clone(),
            from: Location::Warehouse,
            to: Location::Stockist,
            quantity: 31,
            reference: None,
            occurred_at: test_time(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InsufficientStock { available: 30, requested: 31, .. })
    ));
    assert_eq!(services.stock.movements_for(&product).unwrap().len(), 2);
}

#[test]
fn oversized_invoice_line_is_rejected_before_any_stock_moves() {
    let services = Services::new(InMemoryStore::new());
    let product = add_product(&services);
    receive(&services, &product, Location::Stockist, 100);

    let mut big = line(&product, 10_000_000_000, "");
    big.rate = 1_000_000_000;
    let outcome: Outcome<_> = services
        .invoices
        .create_invoice(InvoiceKind::Stockist, request(vec![big]), test_time())
        .into();

    assert!(!outcome.success);
    assert!(outcome.errors.contains(&"Amount is too large for item 1".to_string()));
    assert_eq!(services.stock.stock_level(&product, Some(Location::Stockist)).unwrap(), 100);
    assert!(services.storage.fetch::<InvoiceBook>().unwrap().is_empty());
}

#[test]
fn superstockist_invoice_moves_stock_down_to_stockist() {
    let services = Services::new(InMemoryStore::new());
    let product = add_product(&services);
    receive(&services, &product, Location::Superstockist, 50);

    let invoice = services
        .invoices
        .create_invoice(InvoiceKind::Superstockist, request(vec![line(&product, 50, "")]), test_time())
        .unwrap();

    assert_eq!(invoice.invoice_number(), "SS24030001");
    assert_eq!(services.stock.stock_level(&product, Some(Location::Superstockist)).unwrap(), 0);
    assert_eq!(services.stock.stock_level(&product, Some(Location::Stockist)).unwrap(), 50);
    assert_eq!(services.stock.stock_level(&product, None).unwrap(), 50);
}

#[test]
fn insufficient_stock_aborts_the_whole_invoice() {
    let services = Services::new(InMemoryStore::new());
    let product = add_product(&services);
    receive(&services, &product, Location::Stockist, 30);
    let movements_before = services.storage.fetch::<MovementLog>().unwrap().len();

    // first line fits, second does not
    let err = services
        .invoices
        .create_invoice(
            InvoiceKind::Stockist,
            request(vec![line(&product, 20, ""), line(&product, 20, "")]),
            test_time(),
        )
        .unwrap_err();

    match err {
        ServiceError::Domain(DomainError::InsufficientStock { available, requested, .. }) => {
            assert_eq!(available, 10);
            assert_eq!(requested, 20);
        }
        _ => panic!("unexpected error: {err:?}"),
    }
    assert_eq!(services.stock.stock_level(&product, Some(Location::Stockist)).unwrap(), 30);
    assert_eq!(services.stock.stock_level(&product, Some(Location::Retailer)).unwrap(), 0);
    assert!(services.storage.fetch::<InvoiceBook>().unwrap().is_empty());
    assert_eq!(services.storage.fetch::<MovementLog>().unwrap().len(), movements_before);
}

#[test]
fn invalid_request_reports_every_rule() {
    let services = Services::new(InMemoryStore::new());
    let mut bad = request(vec![line(&ProductId::from_raw(""), 0, "")]);
    bad.from_party = String::new();

    let outcome: Outcome<_> = services
        .invoices
        .create_invoice(InvoiceKind::Stockist, bad, test_time())
        .into();

    assert!(!outcome.success);
    assert_eq!(
        outcome.errors,
        vec![
            "From party is required",
            "Product is required for item 1",
            "Valid quantity is required for item 1",
        ]
    );
    assert!(services.storage.store().get(Namespace::Invoices.key()).unwrap().is_none());
}

#[test]
fn failed_flush_restores_already_written_namespaces() {
    let store = Arc::new(FailingStore::default());
    let services = Services::new(store.clone());
    let product = add_product(&services);
    receive(&services, &product, Location::Stockist, 40);
    let inventory_before = store.get(Namespace::Inventory.key()).unwrap();

    store.fail_writes_to(Namespace::StockMovements.key());
    let err = services
        .invoices
        .create_invoice(InvoiceKind::Stockist, request(vec![line(&product, 5, "")]), test_time())
        .unwrap_err();

    assert!(matches!(err, ServiceError::Store(StoreError::Rejected(_))));
    assert_eq!(store.get(Namespace::Inventory.key()).unwrap(), inventory_before);
    assert_eq!(store.get(Namespace::Invoices.key()).unwrap(), None);
}

#[test]
fn credit_breach_is_advisory() {
    let services = Services::new(InMemoryStore::new());
    let product = add_product(&services);
    receive(&services, &product, Location::Superstockist, 10);
    let stockist = services
        .directory
        .register(NewDistributor {
            kind: DistributorKind::Stockist,
            name: "Silchar Stockist".to_string(),
            contact_person: "Rajesh Sharma".to_string(),
            phone: "9876543210".to_string(),
            email: None,
            address: None,
            gstin: None,
            pan: None,
            credit_limit: 100,
            region: "Silchar".to_string(),
            territory: "Cachar".to_string(),
            payment_terms: None,
            monthly_target: 0,
            warehouse_capacity: 0,
            occurred_at: test_time(),
        })
        .unwrap();

    let mut req = request(vec![line(&product, 10, "")]);
    req.to_party = stockist.id().to_string();
    let invoice = services
        .invoices
        .create_invoice(InvoiceKind::Superstockist, req, test_time())
        .unwrap();
    assert!(invoice.grand_total() > 100);
    assert_eq!(services.directory.display_name(stockist.id()).unwrap(), "Silchar Stockist");
}

#[test]
fn invoice_lifecycle_through_the_engine() {
    let services = Services::new(InMemoryStore::new());
    let product = add_product(&services);
    receive(&services, &product, Location::Stockist, 100);
    let first = services
        .invoices
        .create_invoice(InvoiceKind::Stockist, request(vec![line(&product, 10, "")]), test_time())
        .unwrap();
    let second = services
        .invoices
        .create_invoice(InvoiceKind::Stockist, request(vec![line(&product, 10, "")]), test_time())
        .unwrap();
    assert_eq!(second.invoice_number(), "ST24030002");

    services.invoices.mark_paid(first.id(), date(2024, 3, 10), test_time()).unwrap();
    let moved = services.invoices.refresh_overdue(date(2024, 4, 15), test_time()).unwrap();
    assert_eq!(moved, 1);

    let overdue = services
        .invoices
        .list(
            Some(InvoiceKind::Stockist),
            &InvoiceFilter {
                status: Some(InvoiceStatus::Overdue),
                ..InvoiceFilter::default()
            },
        )
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id(), second.id());

    let err = services.invoices.cancel(second.id(), test_time()).unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::InvalidTransition(_))));

    let summary = services.invoices.summary().unwrap();
    assert_eq!(summary.stockist.paid, 1);
    assert_eq!(summary.stockist.overdue, 1);
    assert_eq!(summary.total_invoices, 2);
}

#[test]
fn loan_payment_persists_loan_and_payment_log() {
    let services = Services::new(InMemoryStore::new());
    let loan = services
        .loans
        .add_personal_loan(NewPersonalLoan {
            lender: "Mr. Agarwal".to_string(),
            lender_contact: String::new(),
            amount: 200_000,
            interest_rate: BasisPoints::percent(12),
            start_date: date(2024, 1, 15),
            monthly_interest: None,
            interest_frequency: InterestFrequency::Monthly,
            principal_repayment: PrincipalRepayment::Bullet,
            purpose: String::new(),
            notes: String::new(),
            occurred_at: test_time(),
        })
        .unwrap();
    assert!(loan.id().as_str().starts_with("PLN"));

    let pay = |amount: i64, principal: Option<i64>, on: NaiveDate| PaymentRequest {
        amount,
        date: on,
        principal,
        penalty: 0,
        payment_method: "cash".to_string(),
        reference: String::new(),
        notes: String::new(),
        occurred_at: test_time(),
    };
    services.loans.record_payment(loan.id(), pay(2_000, None, date(2024, 2, 15))).unwrap();
    services
        .loans
        .record_payment(loan.id(), pay(202_000, Some(200_000), date(2024, 3, 15)))
        .unwrap();

    let stored = services.loans.get(loan.id()).unwrap().unwrap();
    assert_eq!(stored.status(), LoanStatus::Paid);
    assert_eq!(stored.balance(), 0);

    let history = services.loans.payments_for(loan.id()).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].date, date(2024, 3, 15));
    assert!(history[0].id.as_str().starts_with("PMT"));

    let err = services
        .loans
        .record_payment(loan.id(), pay(100, None, date(2024, 4, 15)))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::InvalidTransition(_))));
    assert_eq!(services.loans.payments_for(loan.id()).unwrap().len(), 2);
    assert!(services.loans.upcoming_payments(date(2024, 4, 1), 60).unwrap().is_empty());
}

#[test]
fn archiving_a_superstockist_releases_its_stockists() {
    let services = Services::new(InMemoryStore::new());
    load_sample_data(&services.storage, date(2024, 3, 1), test_time()).unwrap();

    let parent = DistributorId::from_raw("DIST003");
    let child = DistributorId::from_raw("DIST001");
    assert_eq!(services.directory.stockists_of(&parent).unwrap().len(), 2);
    assert_eq!(
        services.directory.superstockist_of(&child).unwrap().map(|d| d.id().clone()),
        Some(parent.clone())
    );

    services.directory.archive(&parent, test_time()).unwrap();
    assert!(services.directory.superstockist_of(&child).unwrap().is_none());
    assert!(services.directory.list_active(DistributorKind::Superstockist).unwrap().is_empty());
}

#[test]
fn sample_data_survives_a_reopen_of_the_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let today = date(2024, 3, 1);
    {
        let storage = Storage::new(JsonFileStore::open(dir.path(), "sanj_healthcare_").unwrap());
        assert!(storage.is_empty().unwrap());
        let report = load_sample_data(&storage, today, test_time()).unwrap();
        assert_eq!(report.products, 6);
        assert_eq!(report.distributors, 3);
        assert_eq!(report.inventory_items, 6);
        assert_eq!(report.loans, 2);
        assert_eq!(report.expenses, 5);
    }
    assert!(dir.path().join("sanj_healthcare_stock_movements.json").exists());

    let services = Services::new(JsonFileStore::open(dir.path(), "sanj_healthcare_").unwrap());
    assert!(!services.storage.is_empty().unwrap());
    assert_eq!(services.catalog.list_active().unwrap().len(), 6);
    assert_eq!(services.storage.fetch::<StockBook>().unwrap().items().len(), 6);
    assert_eq!(services.storage.fetch::<MovementLog>().unwrap().len(), 6);

    // PROD001 opens at 45 against a minimum of 50; PROD004 at 32 against 40
    let low = services.stock.low_stock_items().unwrap();
    assert_eq!(low.len(), 2);
    let expiring = services.stock.expiring_items(today, 30).unwrap();
    assert_eq!(expiring.len(), 1);

    let upcoming = services.loans.upcoming_payments(today, 7).unwrap();
    assert_eq!(upcoming.len(), 2);
    assert!(upcoming[0].due_date <= upcoming[1].due_date);

    let summary = services.stock.stock_summary(today).unwrap();
    assert_eq!(summary.total_items, 6);
    assert_eq!(summary.by_location[&Location::Warehouse].items, 6);
}
