use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use portfolio_models::contact::ContactMessage;
use portfolio_persistence_contracts::contact::ContactRepository;
use uuid::uuid;

/// All demo messages in listing order (newest first).
pub static ALL_MESSAGES: LazyLock<Vec<&ContactMessage>> =
    LazyLock::new(|| vec![&DAVE, &CAROL, &BOB, &ALICE]);

pub static ALICE: LazyLock<ContactMessage> = LazyLock::new(|| ContactMessage {
    id: uuid!("0b4d6c2e-3f7a-4e51-9d1c-8a2f6e4b7c10").into(),
    name: "Alice".try_into().unwrap(),
    email: "alice@example.com".parse().unwrap(),
    message: "Hi, I really like your portfolio!".try_into().unwrap(),
    created_at: timestamp("2024-03-01T09:15:00Z"),
});

pub static BOB: LazyLock<ContactMessage> = LazyLock::new(|| ContactMessage {
    id: uuid!("7e91a3d4-52c8-4b0f-a6e2-d13f58b904c7").into(),
    name: "Bob".try_into().unwrap(),
    email: "bob@example.org".parse().unwrap(),
    message: "Are you available for freelance work next month?"
        .try_into()
        .unwrap(),
    created_at: timestamp("2024-03-05T17:42:10Z"),
});

pub static CAROL: LazyLock<ContactMessage> = LazyLock::new(|| ContactMessage {
    id: uuid!("3a5f0c19-8d27-4c6e-b1a4-6f9e2d8c5b31").into(),
    name: "Carol".try_into().unwrap(),
    email: "carol@gmail.com".parse().unwrap(),
    message: "Let's grab a coffee and talk about Rust.".try_into().unwrap(),
    created_at: timestamp("2024-03-10T12:00:00Z"),
});

/// Created at the same instant as [`CAROL`], but with a greater id.
pub static DAVE: LazyLock<ContactMessage> = LazyLock::new(|| ContactMessage {
    id: uuid!("f3c8e2a7-1b6d-4f09-8e5a-2c7d9b4a6e18").into(),
    name: "Dave".try_into().unwrap(),
    email: "dave@example.net".parse().unwrap(),
    message: "Found a typo on your about page.".try_into().unwrap(),
    created_at: timestamp("2024-03-10T12:00:00Z"),
});

fn timestamp(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

pub async fn create<Txn: Send + Sync + 'static>(
    txn: &mut Txn,
    repo: impl ContactRepository<Txn>,
) -> anyhow::Result<()> {
    for &message in ALL_MESSAGES.iter().rev() {
        repo.create(txn, message).await?;
    }
    Ok(())
}
