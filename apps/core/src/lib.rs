pub mod action_executor;
pub mod aggregate;
pub mod config;
pub mod contract;
pub mod controller;
pub mod corpus;
pub mod discovery;
pub mod documents;
pub mod fuzzy;
pub mod learning;
pub mod loader;
pub mod logging;
pub mod model;
pub mod runtime;
pub mod search;
pub mod settings;
pub mod store;
pub mod synonyms;
pub mod transport;
pub mod view_state;
