pub mod auth_pipeline;
pub mod config;
pub mod contracts;
pub mod error_bus;
pub mod event_handlers;
pub mod events;
pub mod factory;
pub mod guards;
pub mod initialization;
pub mod models;
pub mod plugins;
pub mod registry;
pub mod secret;
pub mod validator;

mod event_pipeline;

#[cfg(test)]
pub(crate) mod testing;
