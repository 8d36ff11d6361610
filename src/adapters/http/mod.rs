// HTTP adapter: axum router, handlers and the rendered converter page.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod page;
pub mod router;
pub mod state;

pub use router::{build_router, run_server};
pub use state::AppState;
