//! Sample data for a first run against an empty store.
//!
//! Everything is built through the domain constructors, so sample records
//! obey the same rules as user-entered ones. Amounts are in paise.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::Serialize;

use pharmaledger_accounting::{
    Expense, ExpenseBook, ExpenseDetails, ExpenseStatus, Frequency, InterestFrequency, Loan,
    LoanBook, NewBankLoan, NewExpense, NewPersonalLoan, PaymentLedger, PrincipalRepayment,
};
use pharmaledger_core::{
    BasisPoints, DistributorId, DomainResult, ExpenseId, InventoryItemId, LoanId, ProductId,
};
use pharmaledger_inventory::{Location, MovementLog, NewInventoryItem, StockBook};
use pharmaledger_invoicing::InvoiceBook;
use pharmaledger_parties::{Address, DistributorDirectory, DistributorKind, NewDistributor};
use pharmaledger_products::{NewProduct, ProductCatalog};

use crate::config::Settings;
use crate::namespace::Namespace;
use crate::store::KeyValueStore;
use crate::unit_of_work::Storage;

use crate::services::ServiceResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub products: usize,
    pub distributors: usize,
    pub inventory_items: usize,
    pub loans: usize,
    pub expenses: usize,
}

struct SampleProduct {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    cost: i64,
    mrp: i64,
    pack_size: &'static str,
    opening_stock: i64,
    min_stock: i64,
    max_stock: i64,
}

const PRODUCTS: [SampleProduct; 6] = [
    SampleProduct { id: "PROD001", name: "SAZ LQ10", category: "Syrup", cost: 12_000, mrp: 18_000, pack_size: "100ml", opening_stock: 45, min_stock: 50, max_stock: 200 },
    SampleProduct { id: "PROD002", name: "CALSANZ FEM", category: "Tablet", cost: 8_500, mrp: 13_000, pack_size: "10x10 Tablets", opening_stock: 80, min_stock: 50, max_stock: 200 },
    SampleProduct { id: "PROD003", name: "CALSANZ STRONG", category: "Tablet", cost: 9_500, mrp: 15_000, pack_size: "10x10 Tablets", opening_stock: 75, min_stock: 50, max_stock: 200 },
    SampleProduct { id: "PROD004", name: "NEURON PLUS INJECTION", category: "Injection", cost: 4_500, mrp: 7_000, pack_size: "1ml x 10", opening_stock: 32, min_stock: 40, max_stock: 150 },
    SampleProduct { id: "PROD005", name: "RABSANZ DSR", category: "Capsule", cost: 11_000, mrp: 16_500, pack_size: "10x10 Capsules", opening_stock: 90, min_stock: 50, max_stock: 200 },
    SampleProduct { id: "PROD006", name: "SINOPLEX SYRUP", category: "Syrup", cost: 7_500, mrp: 11_500, pack_size: "100ml", opening_stock: 70, min_stock: 50, max_stock: 200 },
];

const HSN_PHARMA: &str = "30049099";

fn catalog(at: DateTime<Utc>) -> DomainResult<ProductCatalog> {
    let mut catalog = ProductCatalog::default();
    for p in &PRODUCTS {
        catalog.add(
            ProductId::from_raw(p.id),
            NewProduct {
                name: p.name.to_string(),
                category: p.category.to_string(),
                cost_price: p.cost,
                mrp: p.mrp,
                tax_rate: BasisPoints::percent(12),
                hsn_code: HSN_PHARMA.to_string(),
                manufacturer: None,
                pack_size: p.pack_size.to_string(),
                min_stock_level: Some(p.min_stock),
                max_stock_level: Some(p.max_stock),
                occurred_at: at,
            },
        )?;
    }
    Ok(catalog)
}

/// Warehouse opening stock, one batch per product.
fn stock(today: NaiveDate, at: DateTime<Utc>) -> DomainResult<(StockBook, MovementLog)> {
    let mut book = StockBook::default();
    let mut log = MovementLog::default();
    for (n, p) in PRODUCTS.iter().enumerate() {
        // Spread expiries so some land inside the near-expiry window.
        let expiry = today + Duration::days(20 + 90 * n as i64);
        let (_, opening) = book.register_item(
            InventoryItemId::from_raw(format!("INV{:03}", n + 1)),
            NewInventoryItem {
                product_id: ProductId::from_raw(p.id),
                product_name: p.name.to_string(),
                batch_number: format!("B{}{:02}", today.format("%y%m"), n + 1),
                location: Location::Warehouse,
                distributor_id: None,
                quantity: p.opening_stock,
                min_stock_level: Some(p.min_stock),
                reorder_point: Some(p.min_stock),
                max_stock_level: Some(p.max_stock),
                cost_price: p.cost,
                mrp: p.mrp,
                expiry_date: Some(expiry),
                shelf_location: format!("R{}", n + 1),
                occurred_at: at,
            },
        )?;
        log.extend(opening);
    }
    Ok((book, log))
}

fn address(street: &str, city: &str, pincode: &str) -> Option<Address> {
    Some(Address {
        street: street.to_string(),
        city: city.to_string(),
        pincode: pincode.to_string(),
        ..Address::default()
    })
}

fn directory(at: DateTime<Utc>) -> DomainResult<DistributorDirectory> {
    let mut dir = DistributorDirectory::default();
    let superstockist = DistributorId::from_raw("DIST003");
    dir.register(
        superstockist.clone(),
        NewDistributor {
            kind: DistributorKind::Superstockist,
            name: "North East Superstockist".to_string(),
            contact_person: "Amit Kumar".to_string(),
            phone: "9876543212".to_string(),
            email: Some("amit@nesuperstockist.com".to_string()),
            address: address("Beltola Road", "Guwahati", "781028"),
            gstin: Some("18AABCU9603R1ZO".to_string()),
            pan: None,
            credit_limit: 200_000_000,
            region: "North East".to_string(),
            territory: "Assam".to_string(),
            payment_terms: Some("60 days".to_string()),
            monthly_target: 0,
            warehouse_capacity: 5_000,
            occurred_at: at,
        },
    )?;

    let stockists = [
        ("DIST001", "Silchar Stockist", "Rajesh Sharma", "9876543210", "rajesh@silcharstockist.com", "Hospital Road", "Silchar", "788001", "18AABCU9603R1ZM", 50_000_000, 12_500_000, "Silchar", "Cachar", "30 days"),
        ("DIST002", "Guwahati Stockist", "Priya Singh", "9876543211", "priya@guwahatistockist.com", "GS Road", "Guwahati", "781001", "18AABCU9603R1ZN", 75_000_000, 28_500_000, "Guwahati", "Kamrup", "45 days"),
    ];
    for (id, name, contact, phone, email, street, city, pin, gstin, limit, balance, region, territory, terms) in stockists {
        let id = DistributorId::from_raw(id);
        dir.register(
            id.clone(),
            NewDistributor {
                kind: DistributorKind::Stockist,
                name: name.to_string(),
                contact_person: contact.to_string(),
                phone: phone.to_string(),
                email: Some(email.to_string()),
                address: address(street, city, pin),
                gstin: Some(gstin.to_string()),
                pan: None,
                credit_limit: limit,
                region: region.to_string(),
                territory: territory.to_string(),
                payment_terms: Some(terms.to_string()),
                monthly_target: 0,
                warehouse_capacity: 0,
                occurred_at: at,
            },
        )?;
        dir.add_balance(&id, balance, at)?;
        dir.assign(&id, &superstockist, at)?;
    }
    dir.add_balance(&superstockist, 65_000_000, at)?;
    Ok(dir)
}

fn loans(today: NaiveDate, at: DateTime<Utc>) -> DomainResult<LoanBook> {
    let mut book = LoanBook::default();
    let start = today.checked_sub_months(Months::new(6)).unwrap_or(today);
    book.add(Loan::open_bank(
        LoanId::from_raw("BLN001"),
        NewBankLoan {
            bank: "State Bank of India".to_string(),
            account_number: String::new(),
            amount: 50_000_000,
            interest_rate: BasisPoints::from_bps(950),
            tenure_months: 48,
            emi: None,
            start_date: start,
            emi_due_date: Some(today + Duration::days(5)),
            penalty_rate: BasisPoints::percent(2),
            purpose: "Working capital".to_string(),
            notes: String::new(),
            occurred_at: at,
        },
    )?)?;
    book.add(Loan::open_personal(
        LoanId::from_raw("PLN001"),
        NewPersonalLoan {
            lender: "Mr. Agarwal".to_string(),
            lender_contact: String::new(),
            amount: 20_000_000,
            interest_rate: BasisPoints::percent(12),
            start_date: today - Duration::days(25),
            monthly_interest: None,
            interest_frequency: InterestFrequency::Monthly,
            principal_repayment: PrincipalRepayment::Bullet,
            purpose: "Stock purchase".to_string(),
            notes: String::new(),
            occurred_at: at,
        },
    )?)?;
    Ok(book)
}

fn expenses(today: NaiveDate, at: DateTime<Utc>) -> DomainResult<ExpenseBook> {
    let mut book = ExpenseBook::default();
    let expense = |id: &str,
                   days_ago: i64,
                   description: &str,
                   amount: i64,
                   category: &str,
                   recurrence: Option<Frequency>,
                   details: ExpenseDetails| {
        Expense::record(
            ExpenseId::from_raw(id),
            NewExpense {
                date: today - Duration::days(days_ago),
                description: description.to_string(),
                amount,
                category: category.to_string(),
                payment_method: "bank".to_string(),
                reference: String::new(),
                recurrence,
                status: ExpenseStatus::Paid,
                notes: String::new(),
                details,
                occurred_at: at,
            },
        )
    };
    let marketing = |doctor: &str, event: &str| ExpenseDetails::Marketing {
        doctor_name: doctor.to_string(),
        event_name: event.to_string(),
        purpose: String::new(),
        expected_roi: None,
        follow_up_date: None,
    };
    let operating = |vendor: &str| ExpenseDetails::Operating {
        vendor: vendor.to_string(),
        bill_number: String::new(),
        due_date: None,
        paid_date: None,
        tax_amount: 0,
        is_essential: true,
    };

    book.add(expense("MEXP001", 15, "Doctor Conference Participation", 2_500_000, "Conference", None, marketing("Multiple Doctors", "Regional CME"))?);
    book.add(expense("MEXP002", 10, "Product Samples Distribution", 1_500_000, "Samples", None, marketing("Dr. Sharma, Dr. Patel", ""))?);
    book.add(expense("OEXP001", 29, "Staff Salaries", 8_500_000, "Salary", Some(Frequency::Monthly), operating("Payroll"))?);
    book.add(expense("OEXP002", 25, "Office Rent", 2_500_000, "Rent", Some(Frequency::Monthly), operating("Landlord"))?);
    book.add(expense("OEXP003", 20, "Electricity Bill", 850_000, "Utilities", Some(Frequency::Monthly), operating("APDCL"))?);
    Ok(book)
}

/// Writes the sample data set in one unit of work, replacing whatever the
/// namespaces held.
pub fn load_sample_data<S: KeyValueStore>(
    storage: &Storage<S>,
    today: NaiveDate,
    at: DateTime<Utc>,
) -> ServiceResult<SeedReport> {
    let catalog = catalog(at)?;
    let directory = directory(at)?;
    let (stock, movements) = stock(today, at)?;
    let loans = loans(today, at)?;
    let expenses = expenses(today, at)?;

    let report = SeedReport {
        products: catalog.all().len(),
        distributors: directory.stockists().len() + directory.superstockists().len(),
        inventory_items: stock.items().len(),
        loans: loans.bank().len() + loans.personal().len(),
        expenses: expenses.marketing().len() + expenses.operating().len(),
    };

    let mut uow = storage.begin(&Namespace::ALL)?;
    uow.put(&catalog)?;
    uow.put(&directory)?;
    uow.put(&stock)?;
    uow.put(&movements)?;
    uow.put(&InvoiceBook::default())?;
    uow.put(&loans)?;
    uow.put(&PaymentLedger::default())?;
    uow.put(&expenses)?;
    uow.put(&Settings::default())?;
    uow.commit()?;

    tracing::info!(?report, "sample data loaded");
    Ok(report)
}
