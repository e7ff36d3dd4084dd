//! docqa: upload documents to a question-answering service, keep track of
//! what it has indexed, and ask it questions.

pub mod client;
pub mod config;
pub mod error;

pub use client::DocQa;
pub use config::Config;
pub use error::{ClientError, Result};
