use anyhow::Context;
use bb8_postgres::tokio_postgres::Row;
use chrono::{DateTime, Utc};
use portfolio_di::Build;
use portfolio_models::{
    contact::{ContactMessage, ContactMessageAuthorName, ContactMessageContent},
    email_address::EmailAddress,
};
use portfolio_persistence_contracts::contact::ContactRepository;
use uuid::Uuid;

use crate::{arg_indices, columns, PostgresTransaction};

#[derive(Debug, Clone, Build)]
pub struct PostgresContactRepository;

columns!(contact_message as "m": "id", "name", "email", "message", "created_at");

impl ContactRepository<PostgresTransaction> for PostgresContactRepository {
    async fn list(&self, txn: &mut PostgresTransaction) -> anyhow::Result<Vec<ContactMessage>> {
        txn.client()?
            .query(
                &format!(
                    "select {CONTACT_MESSAGE_COLS} from contact_messages m order by m.created_at \
                     desc, m.id desc"
                ),
                &[],
            )
            .await
            .map_err(Into::into)
            .and_then(|rows| {
                rows.into_iter()
                    .map(|row| decode_contact_message(&row, &mut 0))
                    .collect()
            })
    }

    async fn create(
        &self,
        txn: &mut PostgresTransaction,
        message: &ContactMessage,
    ) -> anyhow::Result<()> {
        txn.client()?
            .execute(
                &format!(
                    "insert into contact_messages ({CONTACT_MESSAGE_COL_NAMES}) values ({})",
                    arg_indices(1..=CONTACT_MESSAGE_CNT)
                ),
                &[
                    &*message.id,
                    &message.name.as_str(),
                    &message.email.as_str(),
                    &message.message.as_str(),
                    &message.created_at,
                ],
            )
            .await
            .map(|_| ())
            .map_err(Into::into)
    }
}

fn decode_contact_message(row: &Row, offset: &mut usize) -> anyhow::Result<ContactMessage> {
    let mut idx = || {
        *offset += 1;
        *offset - 1
    };

    Ok(ContactMessage {
        id: row.get::<_, Uuid>(idx()).into(),
        name: ContactMessageAuthorName::try_from(row.get::<_, String>(idx()))
            .context("Stored contact message has an invalid name")?,
        email: EmailAddress::new_unchecked(row.get(idx())),
        message: ContactMessageContent::try_from(row.get::<_, String>(idx()))
            .context("Stored contact message has an invalid message")?,
        created_at: row.get::<_, DateTime<Utc>>(idx()),
    })
}
