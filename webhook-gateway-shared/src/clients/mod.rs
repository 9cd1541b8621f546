pub mod db;
pub mod redis;

pub use db::DbPool;
pub use redis::RedisClient;
