use async_trait::async_trait;
use catalog_db::TxHandle;
use catalog_query::{Filter, Page, PaginationData};

use crate::domain::error::DomainError;
use crate::domain::filters::CustomerFilterField;
use crate::domain::model::{Customer, NewCustomer};

#[async_trait]
pub trait CustomersRepository: Send + Sync {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<Customer>, DomainError>;

    async fn list(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<CustomerFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Customer>, DomainError>;

    /// Inserts the customer row; `customer.addresses` is ignored here.
    async fn create(
        &self,
        tx: &TxHandle<'_>,
        customer: &NewCustomer,
    ) -> Result<Customer, DomainError>;

    async fn update(&self, tx: &TxHandle<'_>, customer: Customer)
    -> Result<Customer, DomainError>;

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError>;
}
