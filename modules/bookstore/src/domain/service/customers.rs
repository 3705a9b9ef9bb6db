use std::sync::Arc;

use catalog_db::TxHandle;
use catalog_query::{Filter, Page, PaginationData};
use tracing::{debug, info, instrument};

use super::{MAX_NAME_LEN, require_email, require_text};
use crate::domain::error::DomainError;
use crate::domain::filters::{AddressFilterField, CustomerFilterField};
use crate::domain::model::{Address, Customer, CustomerDetails, NewAddress, NewCustomer};
use crate::domain::repos::{AddressesRepository, CustomersRepository};

/// Customers and their postal addresses.
pub struct CustomersService<C: CustomersRepository, A: AddressesRepository> {
    customers: Arc<C>,
    addresses: Arc<A>,
}

impl<C: CustomersRepository, A: AddressesRepository> CustomersService<C, A> {
    #[must_use]
    pub fn new(customers: Arc<C>, addresses: Arc<A>) -> Self {
        Self {
            customers,
            addresses,
        }
    }

    #[instrument(skip(self, tx), fields(customer_id = id))]
    pub async fn get_customer(
        &self,
        tx: &TxHandle<'_>,
        id: i64,
    ) -> Result<CustomerDetails, DomainError> {
        debug!("Getting customer by id");
        let customer = self.require_customer(tx, id).await?;
        let addresses = self.addresses.all_by_customer(tx, id).await?;
        Ok(CustomerDetails {
            customer,
            addresses,
        })
    }

    #[instrument(skip_all, fields(filters = filters.len(), page = pagination.page()))]
    pub async fn list_customers(
        &self,
        tx: &TxHandle<'_>,
        filters: &[Filter<CustomerFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Customer>, DomainError> {
        let page = self.customers.list(tx, filters, pagination).await?;
        debug!("Successfully listed {} customers in page", page.items.len());
        Ok(page)
    }

    /// Creates the customer and all of its addresses.
    ///
    /// The rows become visible together when the caller's unit of work commits; a failure on any
    /// address fails the whole call.
    #[instrument(skip(self, tx, new_customer), fields(addresses = new_customer.addresses.len()))]
    pub async fn create_customer(
        &self,
        tx: &TxHandle<'_>,
        new_customer: NewCustomer,
    ) -> Result<CustomerDetails, DomainError> {
        info!("Creating customer");
        require_text("first_name", &new_customer.first_name, MAX_NAME_LEN)?;
        require_text("last_name", &new_customer.last_name, MAX_NAME_LEN)?;
        require_email("email", &new_customer.email)?;
        for address in &new_customer.addresses {
            validate_address(address)?;
        }

        let customer = self.customers.create(tx, &new_customer).await?;
        let mut addresses = Vec::with_capacity(new_customer.addresses.len());
        for address in new_customer.addresses {
            addresses.push(self.addresses.create(tx, customer.id, address).await?);
        }

        info!(customer_id = customer.id, "Successfully created customer");
        Ok(CustomerDetails {
            customer,
            addresses,
        })
    }

    #[instrument(skip(self, tx, customer), fields(customer_id = customer.id))]
    pub async fn update_customer(
        &self,
        tx: &TxHandle<'_>,
        customer: Customer,
    ) -> Result<Customer, DomainError> {
        require_text("first_name", &customer.first_name, MAX_NAME_LEN)?;
        require_text("last_name", &customer.last_name, MAX_NAME_LEN)?;
        require_email("email", &customer.email)?;
        self.customers.update(tx, customer).await
    }

    #[instrument(skip(self, tx), fields(customer_id = id))]
    pub async fn delete_customer(&self, tx: &TxHandle<'_>, id: i64) -> Result<(), DomainError> {
        if !self.customers.delete(tx, id).await? {
            return Err(DomainError::not_found("Customer", id));
        }
        info!("Successfully deleted customer");
        Ok(())
    }

    /// Addresses of one customer.
    #[instrument(skip(self, tx, filters, pagination), fields(filters = filters.len()))]
    pub async fn list_customer_addresses(
        &self,
        tx: &TxHandle<'_>,
        customer_id: i64,
        filters: &[Filter<AddressFilterField>],
        pagination: &PaginationData,
    ) -> Result<Page<Address>, DomainError> {
        self.require_customer(tx, customer_id).await?;
        self.addresses
            .list_by_customer(tx, customer_id, filters, pagination)
            .await
    }

    #[instrument(skip(self, tx, address))]
    pub async fn add_address(
        &self,
        tx: &TxHandle<'_>,
        customer_id: i64,
        address: NewAddress,
    ) -> Result<Address, DomainError> {
        validate_address(&address)?;
        self.require_customer(tx, customer_id).await?;
        let address = self.addresses.create(tx, customer_id, address).await?;
        info!(address_id = address.id, "Successfully added address");
        Ok(address)
    }

    #[instrument(skip(self, tx))]
    pub async fn remove_address(
        &self,
        tx: &TxHandle<'_>,
        customer_id: i64,
        address_id: i64,
    ) -> Result<(), DomainError> {
        match self.addresses.get(tx, address_id).await? {
            Some(address) if address.customer_id == customer_id => {
                self.addresses.delete(tx, address_id).await?;
                Ok(())
            }
            _ => Err(DomainError::not_found("Address", address_id)),
        }
    }

    async fn require_customer(&self, tx: &TxHandle<'_>, id: i64) -> Result<Customer, DomainError> {
        self.customers
            .get(tx, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", id))
    }
}

fn validate_address(address: &NewAddress) -> Result<(), DomainError> {
    require_text("street", &address.street, 200)?;
    require_text("city", &address.city, MAX_NAME_LEN)?;
    require_text("country", &address.country, MAX_NAME_LEN)?;
    require_text("postal_code", &address.postal_code, 16)
}
