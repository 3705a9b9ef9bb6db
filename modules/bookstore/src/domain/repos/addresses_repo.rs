use async_trait::async_trait;
use catalog_db::TxHandle;
use catalog_query::{Filter, Page, PaginationData};

use crate::domain::error::DomainError;
use crate::domain::filters::AddressFilterField;
use crate::domain::model::{Address, NewAddress};

/// Repository trait for Address persistence operations.
#[async_trait]
pub trait AddressesRepository: Send + Sync {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<Address>, DomainError>;

    /// Filtered page of one customer's addresses.
    async fn list_by_customer(
        &self,
        tx: &TxHandle<'_>,
        customer_id: i64,
        filters: &[Filter<AddressFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Address>, DomainError>;

    /// Every address of a customer, unpaged.
    async fn all_by_customer(
        &self,
        tx: &TxHandle<'_>,
        customer_id: i64,
    ) -> Result<Vec<Address>, DomainError>;

    async fn create(
        &self,
        tx: &TxHandle<'_>,
        customer_id: i64,
        address: NewAddress,
    ) -> Result<Address, DomainError>;

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError>;
}
