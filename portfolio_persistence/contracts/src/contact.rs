use std::future::Future;

use portfolio_models::contact::ContactMessage;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactRepository<Txn: Send + Sync + 'static>: Send + Sync + 'static {
    /// Return all contact messages, newest first.
    ///
    /// Messages created at the same time are ordered by id.
    fn list(&self, txn: &mut Txn) -> impl Future<Output = anyhow::Result<Vec<ContactMessage>>> + Send;

    /// Store a new contact message.
    fn create(
        &self,
        txn: &mut Txn,
        message: &ContactMessage,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[cfg(feature = "mock")]
impl<Txn: Send + Sync + 'static> MockContactRepository<Txn> {
    pub fn with_list(mut self, result: Vec<ContactMessage>) -> Self {
        self.expect_list()
            .once()
            .with(mockall::predicate::always())
            .return_once(|_| Box::pin(std::future::ready(Ok(result))));
        self
    }

    pub fn with_list_error(mut self) -> Self {
        self.expect_list()
            .once()
            .with(mockall::predicate::always())
            .return_once(|_| {
                Box::pin(std::future::ready(Err(anyhow::anyhow!(
                    "connection reset by peer"
                ))))
            });
        self
    }

    pub fn with_create(mut self, message: ContactMessage) -> Self {
        self.expect_create()
            .once()
            .with(
                mockall::predicate::always(),
                mockall::predicate::eq(message),
            )
            .return_once(|_, _| Box::pin(std::future::ready(Ok(()))));
        self
    }

    pub fn with_create_error(mut self, message: ContactMessage) -> Self {
        self.expect_create()
            .once()
            .with(
                mockall::predicate::always(),
                mockall::predicate::eq(message),
            )
            .return_once(|_, _| {
                Box::pin(std::future::ready(Err(anyhow::anyhow!(
                    "duplicate key value violates unique constraint"
                ))))
            });
        self
    }
}
