use chrono::Duration;
use portfolio_demo::{
    contact::{ALL_MESSAGES, CAROL, DAVE},
    UUID1,
};
use portfolio_models::{contact::ContactMessage, email_address::EmailAddress};
use portfolio_persistence_contracts::{contact::ContactRepository, Database, Transaction};
use portfolio_persistence_postgres::contact::PostgresContactRepository;
use pretty_assertions::assert_eq;

use crate::common::{setup, setup_clean};

const REPO: PostgresContactRepository = PostgresContactRepository;

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn list() {
    let db = setup().await;
    let mut txn = db.begin_transaction().await.unwrap();

    let result = REPO.list(&mut txn).await.unwrap();

    assert_eq!(result.iter().collect::<Vec<_>>(), *ALL_MESSAGES);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn list_empty() {
    let db = setup_clean().await;
    db.run_migrations(None).await.unwrap();
    let mut txn = db.begin_transaction().await.unwrap();

    let result = REPO.list(&mut txn).await.unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn ties_are_ordered_by_id() {
    let db = setup().await;
    let mut txn = db.begin_transaction().await.unwrap();
    assert_eq!(CAROL.created_at, DAVE.created_at);

    let result = REPO.list(&mut txn).await.unwrap();

    let carol = result.iter().position(|m| m.id == CAROL.id).unwrap();
    let dave = result.iter().position(|m| m.id == DAVE.id).unwrap();
    assert_eq!(dave + 1, carol);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn create() {
    let db = setup().await;

    let message = ContactMessage {
        id: UUID1.into(),
        name: "Eve".try_into().unwrap(),
        email: "eve@example.com".parse().unwrap(),
        message: "Hello there, nice website!".try_into().unwrap(),
        created_at: DAVE.created_at + Duration::seconds(1),
    };

    let mut txn = db.begin_transaction().await.unwrap();
    REPO.create(&mut txn, &message).await.unwrap();
    txn.commit().await.unwrap();

    let mut txn = db.begin_transaction().await.unwrap();
    let result = REPO.list(&mut txn).await.unwrap();
    assert_eq!(result.len(), ALL_MESSAGES.len() + 1);
    assert_eq!(result[0], message);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn create_duplicate_id() {
    let db = setup().await;
    let mut txn = db.begin_transaction().await.unwrap();

    let result = REPO.create(&mut txn, &CAROL).await;

    assert!(result.is_err());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn rollback_discards_created_message() {
    let db = setup().await;

    let mut message = CAROL.clone();
    message.id = UUID1.into();
    let mut txn = db.begin_transaction().await.unwrap();
    REPO.create(&mut txn, &message).await.unwrap();
    txn.rollback().await.unwrap();

    let mut txn = db.begin_transaction().await.unwrap();
    let result = REPO.list(&mut txn).await.unwrap();
    assert_eq!(result.len(), ALL_MESSAGES.len());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn list_does_not_reparse_stored_email() {
    let db = setup().await;

    let mut message = CAROL.clone();
    message.id = UUID1.into();
    message.email = EmailAddress::new_unchecked("i\u{307}nfo@example.com".into());
    let mut txn = db.begin_transaction().await.unwrap();
    REPO.create(&mut txn, &message).await.unwrap();
    txn.commit().await.unwrap();

    let mut txn = db.begin_transaction().await.unwrap();
    let result = REPO.list(&mut txn).await.unwrap();
    assert_eq!(result.len(), ALL_MESSAGES.len() + 1);
    assert!(result.contains(&message));
}
