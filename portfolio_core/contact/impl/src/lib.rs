use std::{net::IpAddr, time::Duration};

use anyhow::Context;
use portfolio_core_contact_contracts::{
    ContactCreateMessageError, ContactFeatureService, ContactListMessagesError,
};
use portfolio_di::Build;
use portfolio_models::{
    contact::{ContactMessage, ContactMessageDraft},
    rate_limit::{RateLimitDecision, RateLimitPolicy},
};
use portfolio_persistence_contracts::{contact::ContactRepository, Database, Transaction};
use portfolio_shared_contracts::{id::IdService, rate_limit::RateLimitService, time::TimeService};
use portfolio_utils::trace_instrument;
use tracing::{debug, info};

pub mod validation;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Build)]
#[cfg_attr(test, derive(Default))]
pub struct ContactFeatureServiceImpl<Db, Id, Time, RateLimit, ContactRepo> {
    db: Db,
    id: Id,
    time: Time,
    rate_limit: RateLimit,
    contact_repo: ContactRepo,
    config: ContactFeatureConfig,
}

#[derive(Debug, Clone)]
pub struct ContactFeatureConfig {
    pub rate_limit: RateLimitPolicy,
}

impl Default for ContactFeatureConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitPolicy {
                max_requests: 5,
                window: Duration::from_secs(15 * 60),
            },
        }
    }
}

/// Rate limit key of a client submitting the contact form.
pub fn rate_limit_key(client_ip: IpAddr) -> String {
    format!("contact:{client_ip}")
}

impl<Db, Id, Time, RateLimit, ContactRepo> ContactFeatureService
    for ContactFeatureServiceImpl<Db, Id, Time, RateLimit, ContactRepo>
where
    Db: Database,
    Id: IdService,
    Time: TimeService,
    RateLimit: RateLimitService,
    ContactRepo: ContactRepository<Db::Transaction>,
{
    #[trace_instrument(skip(self))]
    async fn create_message(
        &self,
        client_ip: IpAddr,
        draft: ContactMessageDraft,
    ) -> Result<ContactMessage, ContactCreateMessageError> {
        let policy = self.config.rate_limit;
        if let RateLimitDecision::Exceeded { retry_after } = self
            .rate_limit
            .check(&rate_limit_key(client_ip), policy)
            .await
        {
            debug!(%client_ip, ?retry_after, "contact rate limit exceeded");
            return Err(ContactCreateMessageError::RateLimited {
                limit: policy.max_requests,
                retry_after,
            });
        }

        let new_message =
            validation::validate(draft).map_err(ContactCreateMessageError::Validation)?;

        let message = ContactMessage {
            id: self.id.generate(),
            name: new_message.name,
            email: new_message.email,
            message: new_message.message,
            created_at: self.time.now(),
        };

        let mut txn = self.db.begin_transaction().await?;

        self.contact_repo
            .create(&mut txn, &message)
            .await
            .context("Failed to save contact message in database")?;

        txn.commit().await?;

        info!(id = %*message.id, "contact message received");

        Ok(message)
    }

    #[trace_instrument(skip(self))]
    async fn list_messages(&self) -> Result<Vec<ContactMessage>, ContactListMessagesError> {
        let mut txn = self.db.begin_transaction().await?;

        self.contact_repo
            .list(&mut txn)
            .await
            .context("Failed to get contact messages from database")
            .map_err(Into::into)
    }
}
