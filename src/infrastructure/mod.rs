pub mod alert;
pub mod config;
pub mod error;
pub mod gemini_client;
pub mod session_store;
pub mod storage;
