pub mod gate;
pub mod handlers;
pub mod session;

pub use gate::{guard, GateDecision};
pub use session::{SessionClaims, SessionKeys};
