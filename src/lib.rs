#![forbid(unsafe_code)]

pub mod adjacency;
pub mod classify;
pub mod cli;
pub mod config;
pub mod formats;
pub mod index;
pub mod ledger;
pub mod listing;
pub mod logging;
pub mod openai;
pub mod page;
pub mod run;
pub mod source;
pub mod translate;
