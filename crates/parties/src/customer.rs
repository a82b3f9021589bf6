use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{CustomerId, DomainError, DomainResult, Entity};
use storefront_sales::Order;

/// Contact information for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub address: String,
    pub phone: String,
}

/// Customer account.
///
/// `order_history` is an in-memory convenience list filled by the order
/// factory during the session; the `orders` collection is the source of truth.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    id: CustomerId,
    name: String,
    email: String,
    contact: ContactInfo,
    registered_at: DateTime<Utc>,
    order_history: Vec<Order>,
}

impl Customer {
    pub fn new(
        id: CustomerId,
        name: impl Into<String>,
        email: impl Into<String>,
        contact: ContactInfo,
        registered_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let email = email.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation(format!("invalid email: {email}")));
        }

        Ok(Self {
            id,
            name,
            email,
            contact,
            registered_at,
            order_history: Vec::new(),
        })
    }

    pub fn id_typed(&self) -> &CustomerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn address(&self) -> &str {
        &self.contact.address
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    pub fn add_order(&mut self, order: Order) {
        self.order_history.push(order);
    }

    pub fn order_history(&self) -> &[Order] {
        &self.order_history
    }

    /// Case-insensitive substring match over name or email.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.email.to_lowercase().contains(&term)
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Persisted shape of a customer inside the `customers` collection.
///
/// The collection is shared with the authentication layer, which keeps
/// credentials on the same record. Fields not modelled here land in `extra`
/// and are written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    /// Older records were written without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl From<&Customer> for CustomerRecord {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.clone(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            address: customer.contact.address.clone(),
            phone: customer.contact.phone.clone(),
            registration_date: Some(customer.registered_at),
            extra: serde_json::Map::new(),
        }
    }
}

impl TryFrom<CustomerRecord> for Customer {
    type Error = DomainError;

    fn try_from(record: CustomerRecord) -> Result<Self, Self::Error> {
        Customer::new(
            record.id,
            record.name,
            record.email,
            ContactInfo {
                address: record.address,
                phone: record.phone,
            },
            record.registration_date.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        )
    }
}
