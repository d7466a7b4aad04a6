pub mod chart;
pub mod config;
pub mod data;
pub mod export;
pub mod logging;
pub mod query;
pub mod server;
pub mod view;

pub use data::{load_table, ContractRecord, ContractTable};
pub use query::{aggregate, query, Filters};
pub use view::{compute_view, Controls, ViewModel};
