pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{account_id_for_token, Account};
pub use routes::create_router;
pub use state::AppState;
