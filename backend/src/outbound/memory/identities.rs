//! Identity partitions of the in-memory store.

use async_trait::async_trait;

use super::{MemoryStore, State, bump};
use crate::domain::ports::{
    IdentityRepository, duplicate_email, duplicate_phone, identity_not_found,
};
use crate::domain::staffing::ensure_mechanic_removable;
use crate::domain::{
    Customer, CustomerId, EmailAddress, Error, ExternalId, Identity, IdentityChanges,
    IdentityKey, Mechanic, MechanicId, NewIdentity, PhoneNumber, Role,
};

impl State {
    fn identities(&self, role: Role) -> Vec<Identity> {
        match role {
            Role::Customer => self
                .customers
                .values()
                .cloned()
                .map(Identity::Customer)
                .collect(),
            Role::Mechanic => self
                .mechanics
                .values()
                .cloned()
                .map(Identity::Mechanic)
                .collect(),
        }
    }

    fn identity(&self, key: IdentityKey) -> Option<Identity> {
        match key {
            IdentityKey::Customer(id) => self.customers.get(&id).cloned().map(Identity::Customer),
            IdentityKey::Mechanic(id) => self.mechanics.get(&id).cloned().map(Identity::Mechanic),
        }
    }

    /// Reject an email or phone already used by another identity of `role`.
    fn ensure_contact_free(
        &self,
        role: Role,
        except: Option<IdentityKey>,
        email: Option<&EmailAddress>,
        phone: Option<&PhoneNumber>,
    ) -> Result<(), Error> {
        let others = self
            .identities(role)
            .into_iter()
            .filter(|identity| Some(identity.key()) != except);
        for other in others {
            let profile = &other.account().profile;
            if email.is_some_and(|email| *email == profile.email) {
                return Err(duplicate_email());
            }
            if phone.is_some_and(|phone| *phone == profile.phone) {
                return Err(duplicate_phone());
            }
        }
        Ok(())
    }

    fn store(&mut self, identity: Identity) {
        match identity {
            Identity::Customer(customer) => {
                self.customers.insert(customer.id, customer);
            }
            Identity::Mechanic(mechanic) => {
                self.mechanics.insert(mechanic.id, mechanic);
            }
        }
    }

    fn remove_customer(&mut self, id: CustomerId) -> Result<(), Error> {
        if self.customers.remove(&id).is_none() {
            return Err(identity_not_found(IdentityKey::Customer(id)));
        }
        self.tickets.retain(|_, row| row.customer_id != id);
        Ok(())
    }

    fn remove_mechanic(&mut self, id: MechanicId) -> Result<(), Error> {
        if !self.mechanics.contains_key(&id) {
            return Err(identity_not_found(IdentityKey::Mechanic(id)));
        }
        let assignments: Vec<_> = self
            .tickets
            .iter()
            .filter(|(_, row)| row.mechanic_ids.contains(&id))
            .map(|(ticket_id, row)| (*ticket_id, row.mechanic_ids.len()))
            .collect();
        ensure_mechanic_removable(id, &assignments)?;
        for row in self.tickets.values_mut() {
            row.mechanic_ids.remove(&id);
        }
        self.mechanics.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl IdentityRepository for MemoryStore {
    async fn insert(&self, identity: NewIdentity) -> Result<Identity, Error> {
        self.write(|state| {
            let profile = &identity.account().profile;
            state.ensure_contact_free(
                identity.role(),
                None,
                Some(&profile.email),
                Some(&profile.phone),
            )?;
            let stored = match identity {
                NewIdentity::Customer { account } => Identity::Customer(Customer {
                    id: CustomerId::new(bump(&mut state.sequences.customer)),
                    account,
                }),
                NewIdentity::Mechanic { account, salary } => Identity::Mechanic(Mechanic {
                    id: MechanicId::new(bump(&mut state.sequences.mechanic)),
                    account,
                    salary,
                }),
            };
            state.store(stored.clone());
            Ok(stored)
        })
    }

    async fn find(&self, key: IdentityKey) -> Result<Option<Identity>, Error> {
        self.read(|state| state.identity(key))
    }

    async fn find_by_external_id(
        &self,
        role: Role,
        external_id: ExternalId,
    ) -> Result<Option<Identity>, Error> {
        self.read(|state| {
            state
                .identities(role)
                .into_iter()
                .find(|identity| identity.account().external_id == external_id)
        })
    }

    async fn find_by_email(
        &self,
        role: Role,
        email: &EmailAddress,
    ) -> Result<Option<Identity>, Error> {
        self.read(|state| {
            state
                .identities(role)
                .into_iter()
                .find(|identity| identity.account().profile.email == *email)
        })
    }

    async fn list(&self, role: Role) -> Result<Vec<Identity>, Error> {
        self.read(|state| state.identities(role))
    }

    async fn update(&self, key: IdentityKey, changes: IdentityChanges) -> Result<Identity, Error> {
        self.write(|state| {
            let mut identity = state.identity(key).ok_or_else(|| identity_not_found(key))?;
            state.ensure_contact_free(
                key.role(),
                Some(key),
                changes.email.as_ref(),
                changes.phone.as_ref(),
            )?;
            changes.apply_to(&mut identity);
            state.store(identity.clone());
            Ok(identity)
        })
    }

    async fn delete(&self, key: IdentityKey) -> Result<(), Error> {
        self.write(|state| match key {
            IdentityKey::Customer(id) => state.remove_customer(id),
            IdentityKey::Mechanic(id) => state.remove_mechanic(id),
        })
    }
}
