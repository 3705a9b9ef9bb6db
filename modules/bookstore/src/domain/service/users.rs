use std::sync::Arc;

use catalog_db::TxHandle;
use catalog_query::{Filter, Page, PaginationData};
use tracing::{debug, info, instrument};

use super::require_email;
use crate::domain::error::DomainError;
use crate::domain::filters::UserFilterField;
use crate::domain::model::{NewUser, User};
use crate::domain::repos::UsersRepository;

/// Accounts. Passwords arrive already hashed; this service only stores the hash.
pub struct UsersService<U: UsersRepository> {
    repo: Arc<U>,
}

impl<U: UsersRepository> UsersService<U> {
    #[must_use]
    pub fn new(repo: Arc<U>) -> Self {
        Self { repo }
    }

    /// Registers a new account. Emails are stored trimmed and lowercased and must be unique.
    #[instrument(skip(self, tx, new_user), fields(role = %new_user.role))]
    pub async fn register(
        &self,
        tx: &TxHandle<'_>,
        new_user: NewUser,
    ) -> Result<User, DomainError> {
        info!("Registering user");
        let email = new_user.email.trim().to_lowercase();
        require_email("email", &email)?;
        if new_user.password_hash.is_empty() {
            return Err(DomainError::validation("password_hash", "must not be empty"));
        }
        if self.repo.find_by_email(tx, &email).await?.is_some() {
            return Err(DomainError::conflict("User", "email", email));
        }

        let user = self
            .repo
            .create(
                tx,
                NewUser {
                    email,
                    ..new_user
                },
            )
            .await?;
        info!(user_id = user.id, "Successfully registered user");
        Ok(user)
    }

    #[instrument(skip(self, tx), fields(user_id = id))]
    pub async fn get_user(&self, tx: &TxHandle<'_>, id: i64) -> Result<User, DomainError> {
        self.repo
            .get(tx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    /// Lookup used by login flows; the email is normalized like at registration.
    #[instrument(skip_all)]
    pub async fn find_by_email(
        &self,
        tx: &TxHandle<'_>,
        email: &str,
    ) -> Result<Option<User>, DomainError> {
        debug!("Looking up user by email");
        self.repo
            .find_by_email(tx, &email.trim().to_lowercase())
            .await
    }

    #[instrument(skip_all, fields(filters = filters.len(), page = pagination.page()))]
    pub async fn list_users(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<UserFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<User>, DomainError> {
        self.repo.list(tx, filters, pagination).await
    }

    #[instrument(skip(self, tx), fields(user_id = id))]
    pub async fn delete_user(&self, tx: &TxHandle<'_>, id: i64) -> Result<(), DomainError> {
        if !self.repo.delete(tx, id).await? {
            return Err(DomainError::not_found("User", id));
        }
        Ok(())
    }
}
