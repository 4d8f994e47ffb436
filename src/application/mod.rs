pub mod auth;
pub mod crypto;
pub mod error;
pub mod jobs;
pub mod ledger;
pub mod pagination;
pub mod partitions;
pub mod posts;
pub mod rate_limits;
pub mod repos;
pub mod tiers;
pub mod transfers;
pub mod users;
