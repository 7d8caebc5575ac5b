pub mod mfa;
pub mod rate_limit;
pub mod security;
pub mod session;
pub mod signature;
