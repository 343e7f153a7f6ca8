pub mod contact_draft;
