//! Stateless repositories; every method takes `&Connection`.

pub mod event;
