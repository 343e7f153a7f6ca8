use std::{future::Future, net::IpAddr, time::Duration};

use portfolio_models::contact::{ContactMessage, ContactMessageDraft, ContactValidationViolation};
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactFeatureService: Send + Sync + 'static {
    /// Validate and store a contact form submission.
    ///
    /// Every call counts against the rate limit of `client_ip`, even if the
    /// submission turns out to be invalid.
    fn create_message(
        &self,
        client_ip: IpAddr,
        draft: ContactMessageDraft,
    ) -> impl Future<Output = Result<ContactMessage, ContactCreateMessageError>> + Send;

    /// Return all stored contact messages, newest first.
    fn list_messages(
        &self,
    ) -> impl Future<Output = Result<Vec<ContactMessage>, ContactListMessagesError>> + Send;
}

#[derive(Debug, Error)]
pub enum ContactCreateMessageError {
    #[error("Too many contact attempts.")]
    RateLimited { limit: u64, retry_after: Duration },
    #[error("The contact message is invalid.")]
    Validation(Vec<ContactValidationViolation>),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ContactListMessagesError {
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockContactFeatureService {
    pub fn with_create_message(
        mut self,
        client_ip: IpAddr,
        draft: ContactMessageDraft,
        result: Result<ContactMessage, ContactCreateMessageError>,
    ) -> Self {
        self.expect_create_message()
            .once()
            .with(
                mockall::predicate::eq(client_ip),
                mockall::predicate::eq(draft),
            )
            .return_once(|_, _| Box::pin(std::future::ready(result)));
        self
    }

    pub fn with_list_messages(
        mut self,
        result: Result<Vec<ContactMessage>, ContactListMessagesError>,
    ) -> Self {
        self.expect_list_messages()
            .once()
            .return_once(|| Box::pin(std::future::ready(result)));
        self
    }
}
