//! Application wiring and lifecycle management.

mod commands;
mod init;
mod publisher;
mod state;

pub use commands::{
    create_request, list_pending, print_json, run_relay_once, run_sweep, update_request,
    ProductFields,
};
pub use init::run_server;
pub use state::CatalogState;
