use async_trait::async_trait;
use catalog_db::{QueryBuilder, TxHandle};
use catalog_query::{Filter, Page, PaginationData};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, RelationTrait};

use crate::domain::error::DomainError;
use crate::domain::filters::AddressFilterField;
use crate::domain::model::{Address, NewAddress};
use crate::domain::repos::AddressesRepository;
use crate::infra::storage::entity::{address, customer};

type AddressQuery = QueryBuilder<address::Entity, AddressFilterField>;

/// ORM-based implementation of the `AddressesRepository` trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrmAddressesRepository;

impl OrmAddressesRepository {
    fn of_customer(customer_id: i64) -> AddressQuery {
        AddressQuery::new()
            .join(address::Relation::Customer.def())
            .scope(customer::Column::Id.eq(customer_id))
    }
}

#[async_trait]
impl AddressesRepository for OrmAddressesRepository {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<Address>, DomainError> {
        let found = address::Entity::find_by_id(id).one(tx.conn()).await?;
        Ok(found.map(Into::into))
    }

    async fn list_by_customer(
        &self,
        tx: &TxHandle<'_>,
        customer_id: i64,
        filters: &[Filter<AddressFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Address>, DomainError> {
        let page = Self::of_customer(customer_id)
            .conditions(filters)
            .get_page(tx, pagination)
            .await?;
        Ok(page.map_items(Into::into))
    }

    async fn all_by_customer(
        &self,
        tx: &TxHandle<'_>,
        customer_id: i64,
    ) -> Result<Vec<Address>, DomainError> {
        let rows = Self::of_customer(customer_id).get_many(tx).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(
        &self,
        tx: &TxHandle<'_>,
        customer_id: i64,
        address: NewAddress,
    ) -> Result<Address, DomainError> {
        let m = address::ActiveModel {
            id: NotSet,
            customer_id: Set(customer_id),
            street: Set(address.street),
            city: Set(address.city),
            country: Set(address.country),
            postal_code: Set(address.postal_code),
        };
        Ok(m.insert(tx.conn()).await?.into())
    }

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError> {
        let result = address::Entity::delete_by_id(id).exec(tx.conn()).await?;
        Ok(result.rows_affected > 0)
    }
}
