pub mod catalog;
pub mod config;
pub mod encoder;
pub mod errors;
pub mod extract;
pub mod index;
pub mod llm_client;
pub mod recommend;
pub mod retrieval;
pub mod routes;
pub mod state;
