//! Dispatcher middlewares.
//!
//! A middleware wraps the handler chain and is installed with
//! `Dispatcher::use_middleware`.

pub mod form_method;

pub use form_method::form_method;
