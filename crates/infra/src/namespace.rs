use core::fmt;

/// Top-level storage keys. Each holds one JSON document.
///
/// The declaration order is the lock acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Namespace {
    Products,
    Distributors,
    Inventory,
    Invoices,
    Loans,
    Payments,
    Expenses,
    StockMovements,
    Settings,
}

impl Namespace {
    pub const ALL: [Namespace; 9] = [
        Namespace::Products,
        Namespace::Distributors,
        Namespace::Inventory,
        Namespace::Invoices,
        Namespace::Loans,
        Namespace::Payments,
        Namespace::Expenses,
        Namespace::StockMovements,
        Namespace::Settings,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Namespace::Products => "products",
            Namespace::Distributors => "distributors",
            Namespace::Inventory => "inventory",
            Namespace::Invoices => "invoices",
            Namespace::Loans => "loans",
            Namespace::Payments => "payments",
            Namespace::Expenses => "expenses",
            Namespace::StockMovements => "stock_movements",
            Namespace::Settings => "settings",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_declaration_order() {
        for (i, ns) in Namespace::ALL.iter().enumerate() {
            assert_eq!(ns.index(), i);
        }
        let mut sorted = Namespace::ALL;
        sorted.sort();
        assert_eq!(sorted, Namespace::ALL);
    }
}
