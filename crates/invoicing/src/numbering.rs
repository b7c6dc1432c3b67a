use chrono::{Datelike, NaiveDate};

/// `<prefix><YY><MM><seq>` where `seq` is one more than the number of
/// existing invoice numbers sharing the prefix, zero-padded to four digits.
///
/// The count is taken over all existing numbers, so concurrent issuers must
/// serialize on the invoice store.
pub fn next_invoice_number<'a>(
    prefix: &str,
    date: NaiveDate,
    existing: impl IntoIterator<Item = &'a str>,
) -> String {
    let count = existing
        .into_iter()
        .filter(|number| number.starts_with(prefix))
        .count();
    format!(
        "{prefix}{:02}{:02}{:04}",
        date.year().rem_euclid(100),
        date.month(),
        count + 1
    )
}
