//! Opens the local data store, seeds it on first run, refreshes derived
//! state and logs a snapshot of the business.

use anyhow::Context;
use chrono::Utc;

use pharmaledger_infra::seed::load_sample_data;
use pharmaledger_infra::{AppConfig, JsonFileStore, Services, Settings};

fn main() -> anyhow::Result<()> {
    pharmaledger_observability::init();

    let config = AppConfig::from_env();
    let store = JsonFileStore::open(&config.data_dir, &config.storage_prefix)
        .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;
    let services = Services::new(store);

    let now = Utc::now();
    let today = now.date_naive();

    if services.storage.is_empty()? {
        if config.seed_sample_data {
            let report = load_sample_data(&services.storage, today, now)
                .context("loading sample data")?;
            tracing::info!(?report, "empty store seeded");
        } else {
            tracing::info!("empty store; sample data disabled");
        }
    }

    let settings: Settings = services.storage.fetch()?;
    tracing::info!(
        company = %settings.company_name,
        data_dir = %config.data_dir.display(),
        "pharmaledger started"
    );

    let moved = services.invoices.refresh_overdue(today, now)?;

    let stock = services.stock.stock_summary(today)?;
    tracing::info!(
        items = stock.total_items,
        quantity = stock.total_quantity,
        value = stock.total_value,
        low_stock = stock.low_stock,
        near_expiry = stock.near_expiry,
        expired = stock.expired,
        "stock summary"
    );
    for item in services.stock.expiring_items(today, config.near_expiry_days)? {
        tracing::warn!(
            product = item.product_name(),
            batch = item.batch_number(),
            location = %item.location(),
            expiry = ?item.expiry_date(),
            "batch nearing expiry"
        );
    }
    for item in services.stock.low_stock_items()? {
        tracing::warn!(
            product = item.product_name(),
            location = %item.location(),
            quantity = item.quantity(),
            min = item.min_stock_level(),
            "stock below minimum"
        );
    }

    let invoices = services.invoices.summary()?;
    tracing::info!(
        total = invoices.total_invoices,
        amount = invoices.total_amount,
        newly_overdue = moved,
        "invoice summary"
    );

    for distributor in services.directory.credit_alerts()? {
        tracing::warn!(
            distributor = distributor.name(),
            balance = distributor.credit().current_balance,
            limit = distributor.credit().credit_limit,
            "distributor near credit limit"
        );
    }

    let loans = services.loans.loan_summary()?;
    tracing::info!(
        balance = loans.total_balance,
        monthly = loans.total_monthly,
        "loan summary"
    );
    for payment in services.loans.upcoming_payments(today, config.upcoming_days)? {
        tracing::info!(
            loan_id = %payment.loan_id,
            description = %payment.description,
            amount = payment.amount,
            due = %payment.due_date,
            "payment due"
        );
    }

    for expense in services.expenses.overdue(today)? {
        tracing::warn!(
            description = expense.description(),
            amount = expense.total_amount(),
            "expense overdue"
        );
    }
    for expense in services.expenses.needing_follow_up(today)? {
        tracing::info!(description = expense.description(), "marketing follow-up due");
    }

    Ok(())
}
