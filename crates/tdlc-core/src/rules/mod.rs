pub mod catalog;
pub mod classify;
pub mod document;
pub mod eval;
pub mod matcher;
pub mod source;
pub mod store;
