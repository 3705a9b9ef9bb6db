use async_trait::async_trait;
use catalog_db::{QueryBuilder, TxHandle};
use catalog_query::{Filter, Page, PaginationData};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, EntityTrait};

use crate::domain::error::DomainError;
use crate::domain::filters::CustomerFilterField;
use crate::domain::model::{Customer, NewCustomer};
use crate::domain::repos::CustomersRepository;
use crate::infra::storage::entity::customer;

/// ORM-based implementation of the `CustomersRepository` trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrmCustomersRepository;

#[async_trait]
impl CustomersRepository for OrmCustomersRepository {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<Customer>, DomainError> {
        let found = customer::Entity::find_by_id(id).one(tx.conn()).await?;
        Ok(found.map(Into::into))
    }

    async fn list(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<CustomerFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Customer>, DomainError> {
        let page = QueryBuilder::<customer::Entity, CustomerFilterField>::new()
            .conditions(filters)
            .get_page(tx, pagination)
            .await?;
        Ok(page.map_items(Into::into))
    }

    async fn create(
        &self,
        tx: &TxHandle<'_>,
        customer: &NewCustomer,
    ) -> Result<Customer, DomainError> {
        let m = customer::ActiveModel {
            id: NotSet,
            user_id: Set(customer.user_id),
            first_name: Set(customer.first_name.clone()),
            last_name: Set(customer.last_name.clone()),
            email: Set(customer.email.clone()),
            phone: Set(customer.phone.clone()),
        };
        Ok(m.insert(tx.conn()).await?.into())
    }

    async fn update(
        &self,
        tx: &TxHandle<'_>,
        customer: Customer,
    ) -> Result<Customer, DomainError> {
        if self.get(tx, customer.id).await?.is_none() {
            return Err(DomainError::not_found("Customer", customer.id));
        }
        let m = customer::ActiveModel {
            id: Set(customer.id),
            user_id: Set(customer.user_id),
            first_name: Set(customer.first_name),
            last_name: Set(customer.last_name),
            email: Set(customer.email),
            phone: Set(customer.phone),
        };
        Ok(m.update(tx.conn()).await?.into())
    }

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError> {
        let result = customer::Entity::delete_by_id(id).exec(tx.conn()).await?;
        Ok(result.rows_affected > 0)
    }
}
