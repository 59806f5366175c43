pub mod cookie;
pub mod state;
pub mod store;

pub use cookie::{CookieSigner, COOKIE_NAME};
pub use state::{AskReport, Exchange, ResetReport, SessionState, StatsSnapshot};
pub use store::SessionStore;
