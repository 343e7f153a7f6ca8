use serde::Serialize;

pub mod contact;

/// Body of every failed request.
#[derive(Serialize)]
pub struct ApiError {
    pub success: bool,
    pub message: &'static str,
}

impl ApiError {
    pub fn new(message: &'static str) -> Self {
        Self {
            success: false,
            message,
        }
    }
}
