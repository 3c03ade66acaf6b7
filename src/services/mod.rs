//! Service layer for the fetcher.
//!
//! This module contains the business logic for:
//! - Portal login (`SessionEstablisher`)
//! - Result page decoding (`decoder::decode`)
//! - Item downloads (`ItemFetcher`)

pub mod decoder;
mod fetcher;
mod session;

pub use decoder::decode;
pub use fetcher::{FetchOutcome, FormatFilter, ItemFetcher};
pub use session::{
    LOGIN_NAME_FIELD, PASSWORD_FIELD, REMEMBER_ME_FIELD, SUBMIT_FIELD, Session, SessionEstablisher,
    hidden_fields,
};
