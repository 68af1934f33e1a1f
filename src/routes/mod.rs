pub mod health;
pub mod payload;
pub mod resources;
mod router;
pub mod table;
pub mod types;

pub use router::create_router;
pub use table::RouteTable;

// Re-export AppState for convenience
pub use crate::state::AppState;
