//! Accounting module: loans and business expenses.
//!
//! Pure domain logic only: no IO, no persistence concerns.

pub mod expense;
pub mod loan;
pub mod loan_book;
pub mod payment;
pub mod schedule;

pub use expense::{
    Expense, ExpenseBook, ExpenseDetails, ExpenseKind, ExpenseStatus, Frequency, NewExpense,
};
pub use loan::{
    InterestFrequency, Loan, LoanKind, LoanStatus, LoanTerms, NewBankLoan, NewPersonalLoan,
    PrincipalRepayment, calculate_emi, monthly_interest,
};
pub use loan_book::{LoanBook, LoanSummary, LoanTypeSummary, UpcomingPayment};
pub use payment::{LoanPayment, PaymentLedger, PaymentRequest};
pub use schedule::{Installment, PaymentSchedule};
