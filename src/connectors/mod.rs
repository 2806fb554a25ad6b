// src/connectors/mod.rs
pub mod clock;
pub mod coinmarketcap;
pub mod messages;
pub mod rpc;
pub mod telegram;
pub mod traits;
