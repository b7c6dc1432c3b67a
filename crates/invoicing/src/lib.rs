//! Invoicing domain module.
//!
//! Invoice line math, bonus schemes, numbering and the invoice status
//! lifecycle. Pure and deterministic; stock routing is expressed as data
//! (`InvoiceKind::source_location` / `destination_location`) for the
//! infrastructure layer to apply.

pub mod book;
pub mod invoice;
pub mod item;
pub mod numbering;
pub mod request;

pub use book::{InvoiceBook, InvoiceFilter, InvoiceSummary, KindSummary};
pub use invoice::{Invoice, InvoiceKind, InvoiceStatus, PaymentTerms};
pub use item::{InvoiceItem, bonus_quantity};
pub use numbering::next_invoice_number;
pub use request::{InvoiceLine, InvoiceRequest, validate_invoice_request};
