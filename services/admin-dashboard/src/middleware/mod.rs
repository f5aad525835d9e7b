pub mod rate_limit;
pub mod session_gate;

pub use rate_limit::LoginRateLimiter;
pub use session_gate::SessionGate;
