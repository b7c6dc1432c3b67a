use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use pharmaledger_accounting::{Expense, ExpenseBook, NewExpense};
use pharmaledger_core::{DomainError, Entity, ExpenseId};

use crate::namespace::Namespace;
use crate::store::KeyValueStore;
use crate::unit_of_work::Storage;

use super::outcome::ServiceResult;

pub struct ExpenseService<S: KeyValueStore> {
    storage: Arc<Storage<S>>,
}

impl<S: KeyValueStore> ExpenseService<S> {
    pub fn new(storage: Arc<Storage<S>>) -> Self {
        Self { storage }
    }

    fn book(&self) -> ServiceResult<ExpenseBook> {
        Ok(self.storage.fetch::<ExpenseBook>()?)
    }

    fn mutate<T>(&self, mutate: impl FnOnce(&mut ExpenseBook) -> Result<T, DomainError>) -> ServiceResult<T> {
        let mut uow = self.storage.begin(&[Namespace::Expenses])?;
        let mut book: ExpenseBook = uow.fetch()?;
        let value = mutate(&mut book)?;
        uow.put(&book)?;
        uow.commit()?;
        Ok(value)
    }

    pub fn add(&self, input: NewExpense) -> ServiceResult<Expense> {
        let id = ExpenseId::generate_at(ExpenseId::PREFIX, input.occurred_at);
        let expense = Expense::record(id, input)?;
        self.mutate(|book| {
            book.add(expense.clone());
            Ok(())
        })?;
        tracing::info!(
            expense_id = %expense.id(),
            kind = ?expense.kind(),
            amount = expense.total_amount(),
            "expense recorded"
        );
        Ok(expense)
    }

    pub fn get(&self, id: &ExpenseId) -> ServiceResult<Option<Expense>> {
        Ok(self.book()?.get(id).cloned())
    }

    pub fn mark_paid(&self, id: &ExpenseId, on: NaiveDate, at: DateTime<Utc>) -> ServiceResult<()> {
        self.mutate(|book| book.get_mut(id)?.mark_paid(on, at))
    }

    pub fn cancel(&self, id: &ExpenseId, at: DateTime<Utc>) -> ServiceResult<()> {
        self.mutate(|book| book.get_mut(id)?.cancel(at))
    }

    pub fn schedule_follow_up(&self, id: &ExpenseId, on: NaiveDate, at: DateTime<Utc>) -> ServiceResult<()> {
        self.mutate(|book| book.get_mut(id)?.schedule_follow_up(on, at))
    }

    pub fn overdue(&self, today: NaiveDate) -> ServiceResult<Vec<Expense>> {
        Ok(self.book()?.overdue(today).into_iter().cloned().collect())
    }

    pub fn needing_follow_up(&self, today: NaiveDate) -> ServiceResult<Vec<Expense>> {
        Ok(self.book()?.needing_follow_up(today).into_iter().cloned().collect())
    }

    pub fn total_between(&self, from: NaiveDate, to: NaiveDate) -> ServiceResult<i64> {
        Ok(self.book()?.total_between(from, to))
    }
}
