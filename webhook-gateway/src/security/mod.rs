pub mod rate_limit;
pub mod replay;
pub mod signature;
