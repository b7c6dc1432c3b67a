use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use pharmaledger_core::{BasisPoints, Entity, ProductId};
use pharmaledger_infra::{InMemoryStore, Services};
use pharmaledger_inventory::{Location, MovementType, StockBook, StockUpdate, Transfer};
use pharmaledger_invoicing::{InvoiceKind, InvoiceLine, InvoiceRequest};
use pharmaledger_products::NewProduct;

fn new_product(name: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        category: "Tablet".to_string(),
        cost_price: 8_500,
        mrp: 13_000,
        tax_rate: BasisPoints::percent(12),
        hsn_code: "30049099".to_string(),
        manufacturer: None,
        pack_size: "10x10 Tablets".to_string(),
        min_stock_level: None,
        max_stock_level: None,
        occurred_at: Utc::now(),
    }
}

fn setup(products: usize, opening: i64) -> (Services<InMemoryStore>, Vec<ProductId>) {
    let services = Services::new(InMemoryStore::new());
    let mut ids = Vec::with_capacity(products);
    for n in 0..products {
        let product = services.catalog.add(new_product(&format!("PRODUCT {n}"))).unwrap();
        let id = product.id().clone();
        services
            .stock
            .update_stock(StockUpdate::new(
                id.clone(),
                Location::Warehouse,
                opening,
                MovementType::Purchase,
                Utc::now(),
            ))
            .unwrap();
        ids.push(id);
    }
    (services, ids)
}

/// In-memory book only: no serialization, no locking.
fn bench_book_update_stock(c: &mut Criterion) {
    let mut group = c.benchmark_group("book_update_stock");

    for book_size in [10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("purchase", book_size), &book_size, |b, &size| {
            let mut book = StockBook::default();
            let ids: Vec<_> = (0..size).map(|n| ProductId::from_raw(format!("PROD{n:04}"))).collect();
            for id in &ids {
                book.update_stock(StockUpdate::new(
                    id.clone(),
                    Location::Warehouse,
                    10,
                    MovementType::Purchase,
                    Utc::now(),
                ))
                .unwrap();
            }
            let target = ids[size / 2].clone();
            b.iter(|| {
                book.update_stock(StockUpdate::new(
                    black_box(target.clone()),
                    Location::Warehouse,
                    1,
                    MovementType::Purchase,
                    Utc::now(),
                ))
                .unwrap()
            });
        });
    }

    group.finish();
}

/// Full service path: lock, load, mutate, serialize, write.
fn bench_ledger_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("stock_ledger");
    group.sample_size(200);

    group.bench_function("update_stock", |b| {
        let (services, ids) = setup(20, 100);
        b.iter(|| {
            services
                .stock
                .update_stock(StockUpdate::new(
                    black_box(ids[0].clone()),
                    Location::Warehouse,
                    1,
                    MovementType::Purchase,
                    Utc::now(),
                ))
                .unwrap()
        });
    });

    group.bench_function("transfer_there_and_back", |b| {
        let (services, ids) = setup(20, 100);
        let transfer = |from, to| Transfer {
            product_id: ids[0].clone(),
            from,
            to,
            quantity: 5,
            reference: None,
            occurred_at: Utc::now(),
        };
        b.iter(|| {
            services
                .stock
                .transfer_stock(transfer(Location::Warehouse, Location::Stockist))
                .unwrap();
            services
                .stock
                .transfer_stock(transfer(Location::Stockist, Location::Warehouse))
                .unwrap();
        });
    });

    group.finish();
}

fn bench_invoice_issue(c: &mut Criterion) {
    let mut group = c.benchmark_group("invoice_issue");

    for lines in [1usize, 5, 20] {
        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::new("stockist", lines), &lines, |b, &lines| {
            let (services, ids) = setup(lines, 0);
            for id in &ids {
                services
                    .stock
                    .update_stock(StockUpdate::new(
                        id.clone(),
                        Location::Stockist,
                        1_000_000,
                        MovementType::Purchase,
                        Utc::now(),
                    ))
                    .unwrap();
            }
            let request = InvoiceRequest {
                date: Utc::now().date_naive(),
                from_party: "DIST001".to_string(),
                to_party: "City Medicals".to_string(),
                items: ids
                    .iter()
                    .map(|id| InvoiceLine {
                        product_id: id.to_string(),
                        product_name: String::new(),
                        hsn_code: String::new(),
                        quantity: 10,
                        rate: 13_000,
                        discount: BasisPoints::percent(5),
                        tax_rate: BasisPoints::percent(12),
                        bonus_scheme: "10+1".to_string(),
                    })
                    .collect(),
                payment_terms: None,
                notes: String::new(),
            };
            b.iter(|| {
                services
                    .invoices
                    .create_invoice(InvoiceKind::Stockist, black_box(request.clone()), Utc::now())
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_book_update_stock,
    bench_ledger_round_trip,
    bench_invoice_issue
);
criterion_main!(benches);
