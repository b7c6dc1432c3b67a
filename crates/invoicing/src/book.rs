use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pharmaledger_core::{DistributorId, Entity, InvoiceId};

use crate::invoice::{Invoice, InvoiceKind, InvoiceStatus};
use crate::numbering::next_invoice_number;

/// Optional criteria for listing invoices; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub from_party: Option<DistributorId>,
}

impl InvoiceFilter {
    fn matches(&self, invoice: &Invoice) -> bool {
        self.status.is_none_or(|s| invoice.status() == s)
            && self.from_date.is_none_or(|d| invoice.date() >= d)
            && self.to_date.is_none_or(|d| invoice.date() <= d)
            && self
                .from_party
                .as_ref()
                .is_none_or(|p| invoice.from_party() == p)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindSummary {
    pub count: usize,
    /// Grand total of every invoice that is not cancelled.
    pub total: i64,
    pub pending: usize,
    pub paid: usize,
    pub overdue: usize,
    pub cancelled: usize,
}

impl KindSummary {
    fn of<'a>(invoices: impl Iterator<Item = &'a Invoice>) -> Self {
        invoices.fold(Self::default(), |mut acc, inv| {
            acc.count += 1;
            match inv.status() {
                InvoiceStatus::Pending => acc.pending += 1,
                InvoiceStatus::Paid => acc.paid += 1,
                InvoiceStatus::Overdue => acc.overdue += 1,
                InvoiceStatus::Cancelled => acc.cancelled += 1,
            }
            if inv.status() != InvoiceStatus::Cancelled {
                acc.total = acc.total.saturating_add(inv.grand_total());
            }
            acc
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub stockist: KindSummary,
    pub superstockist: KindSummary,
    pub total_invoices: usize,
    pub total_amount: i64,
}

/// Both invoice books, persisted under the `invoices` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceBook {
    #[serde(default)]
    stockist: Vec<Invoice>,
    #[serde(default)]
    superstockist: Vec<Invoice>,
}

impl InvoiceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_kind(&self, kind: InvoiceKind) -> &[Invoice] {
        match kind {
            InvoiceKind::Stockist => &self.stockist,
            InvoiceKind::Superstockist => &self.superstockist,
        }
    }

    fn by_kind_mut(&mut self, kind: InvoiceKind) -> &mut Vec<Invoice> {
        match kind {
            InvoiceKind::Stockist => &mut self.stockist,
            InvoiceKind::Superstockist => &mut self.superstockist,
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &Invoice> {
        self.stockist.iter().chain(self.superstockist.iter())
    }

    pub fn len(&self) -> usize {
        self.stockist.len() + self.superstockist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &InvoiceId) -> Option<&Invoice> {
        self.all().find(|inv| inv.id() == id)
    }

    pub fn get_mut(&mut self, id: &InvoiceId) -> Option<&mut Invoice> {
        self.stockist
            .iter_mut()
            .chain(self.superstockist.iter_mut())
            .find(|inv| inv.id() == id)
    }

    /// Next number in `kind`'s series for an invoice dated `date`.
    pub fn next_number(&self, kind: InvoiceKind, date: NaiveDate) -> String {
        next_invoice_number(
            kind.number_prefix(),
            date,
            self.all().map(Invoice::invoice_number),
        )
    }

    pub fn insert(&mut self, invoice: Invoice) {
        self.by_kind_mut(invoice.kind()).push(invoice);
    }

    /// Matching invoices, newest first.
    pub fn list(&self, kind: Option<InvoiceKind>, filter: &InvoiceFilter) -> Vec<&Invoice> {
        let mut out: Vec<&Invoice> = self
            .all()
            .filter(|inv| kind.is_none_or(|k| inv.kind() == k))
            .filter(|inv| filter.matches(inv))
            .collect();
        out.sort_by(|a, b| {
            b.date()
                .cmp(&a.date())
                .then_with(|| b.invoice_number().cmp(a.invoice_number()))
        });
        out
    }

    /// Moves every pending invoice past its due date to overdue; returns how many moved.
    pub fn refresh_overdue(&mut self, today: NaiveDate, at: DateTime<Utc>) -> usize {
        self.stockist
            .iter_mut()
            .chain(self.superstockist.iter_mut())
            .filter_map(|inv| inv.refresh_overdue(today, at).then_some(()))
            .count()
    }

    pub fn summary(&self) -> InvoiceSummary {
        let stockist = KindSummary::of(self.stockist.iter());
        let superstockist = KindSummary::of(self.superstockist.iter());
        InvoiceSummary {
            stockist,
            superstockist,
            total_invoices: stockist.count + superstockist.count,
            total_amount: stockist.total.saturating_add(superstockist.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{InvoiceLine, InvoiceRequest};
    use chrono::TimeZone;
    use pharmaledger_core::BasisPoints;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn issue(book: &mut InvoiceBook, kind: InvoiceKind, on: NaiveDate, from: &str) -> InvoiceId {
        let number = book.next_number(kind, on);
        let id = InvoiceId::from_raw(format!("{}-{number}", kind.id_prefix()));
        let request = InvoiceRequest {
            date: on,
            from_party: from.to_string(),
            to_party: "Retailer".to_string(),
            items: vec![InvoiceLine {
                product_id: "PROD001".to_string(),
                product_name: String::new(),
                hsn_code: String::new(),
                quantity: 10,
                rate: 100,
                discount: BasisPoints::ZERO,
                tax_rate: BasisPoints::percent(12),
                bonus_scheme: String::new(),
            }],
            payment_terms: None,
            notes: String::new(),
        };
        book.insert(Invoice::create(id.clone(), number, kind, request, test_time()).unwrap());
        id
    }

    #[test]
    fn numbering_continues_per_prefix() {
        let mut book = InvoiceBook::new();
        issue(&mut book, InvoiceKind::Stockist, date(2024, 3, 1), "ST1");
        issue(&mut book, InvoiceKind::Superstockist, date(2024, 3, 1), "SS1");
        issue(&mut book, InvoiceKind::Stockist, date(2024, 3, 2), "ST1");

        let numbers: Vec<_> = book.by_kind(InvoiceKind::Stockist).iter().map(Invoice::invoice_number).collect();
        assert_eq!(numbers, vec!["ST24030001", "ST24030002"]);
        assert_eq!(book.next_number(InvoiceKind::Superstockist, date(2024, 4, 1)), "SS24040002");
    }

    #[test]
    fn list_filters_and_sorts_newest_first() {
        let mut book = InvoiceBook::new();
        issue(&mut book, InvoiceKind::Stockist, date(2024, 3, 1), "ST1");
        issue(&mut book, InvoiceKind::Stockist, date(2024, 3, 5), "ST2");
        issue(&mut book, InvoiceKind::Superstockist, date(2024, 3, 3), "SS1");

        let all = book.list(None, &InvoiceFilter::default());
        let dates: Vec<_> = all.iter().map(|i| i.date()).collect();
        assert_eq!(dates, vec![date(2024, 3, 5), date(2024, 3, 3), date(2024, 3, 1)]);

        let filter = InvoiceFilter {
            from_party: Some(DistributorId::from_raw("ST1")),
            ..InvoiceFilter::default()
        };
        assert_eq!(book.list(Some(InvoiceKind::Stockist), &filter).len(), 1);

        let window = InvoiceFilter {
            from_date: Some(date(2024, 3, 2)),
            to_date: Some(date(2024, 3, 4)),
            ..InvoiceFilter::default()
        };
        assert_eq!(book.list(None, &window).len(), 1);
    }

    #[test]
    fn refresh_overdue_counts_changes_and_summary_reflects_them() {
        let mut book = InvoiceBook::new();
        let paid = issue(&mut book, InvoiceKind::Stockist, date(2024, 1, 1), "ST1");
        issue(&mut book, InvoiceKind::Stockist, date(2024, 1, 2), "ST1");
        issue(&mut book, InvoiceKind::Superstockist, date(2024, 3, 1), "SS1");
        book.get_mut(&paid).unwrap().mark_paid(date(2024, 1, 10), test_time()).unwrap();

        assert_eq!(book.refresh_overdue(date(2024, 3, 10), test_time()), 1);
        assert_eq!(book.refresh_overdue(date(2024, 3, 10), test_time()), 0);

        let summary = book.summary();
        assert_eq!(summary.stockist.paid, 1);
        assert_eq!(summary.stockist.overdue, 1);
        assert_eq!(summary.superstockist.pending, 1);
        assert_eq!(summary.total_invoices, 3);
        assert_eq!(summary.total_amount, 3 * 1120);
    }
}
