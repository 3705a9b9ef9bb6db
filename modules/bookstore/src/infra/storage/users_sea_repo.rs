use async_trait::async_trait;
use catalog_db::{QueryBuilder, TxHandle};
use catalog_query::{Filter, Page, PaginationData};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, SqlErr};

use crate::domain::error::DomainError;
use crate::domain::filters::UserFilterField;
use crate::domain::model::{NewUser, User};
use crate::domain::repos::UsersRepository;
use crate::infra::storage::entity::user;
use crate::infra::storage::mapper::try_page;

/// ORM-based implementation of the `UsersRepository` trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrmUsersRepository;

#[async_trait]
impl UsersRepository for OrmUsersRepository {
    async fn get(&self, tx: &TxHandle<'_>, id: i64) -> Result<Option<User>, DomainError> {
        user::Entity::find_by_id(id)
            .one(tx.conn())
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(
        &self,
        tx: &TxHandle<'_>,
        email: &str,
    ) -> Result<Option<User>, DomainError> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(tx.conn())
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<UserFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<User>, DomainError> {
        let page = QueryBuilder::<user::Entity, UserFilterField>::new()
            .conditions(filters)
            .get_page(tx, pagination)
            .await?;
        try_page(page)
    }

    async fn create(&self, tx: &TxHandle<'_>, user: NewUser) -> Result<User, DomainError> {
        let m = user::ActiveModel {
            id: NotSet,
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash),
            role: Set(user.role.as_str().to_owned()),
        };
        match m.insert(tx.conn()).await {
            Ok(row) => User::try_from(row),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(DomainError::conflict("User", "email", user.email))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, tx: &TxHandle<'_>, id: i64) -> Result<bool, DomainError> {
        let result = user::Entity::delete_by_id(id).exec(tx.conn()).await?;
        Ok(result.rows_affected > 0)
    }
}
