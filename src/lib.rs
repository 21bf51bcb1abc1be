pub mod api;
pub mod completion;
pub mod config;
pub mod context;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod routing;
pub mod state;
pub mod stream;
pub mod transport;
