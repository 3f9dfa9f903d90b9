//! Database access layer: plain async functions issuing parameterized
//! statements over the shared pool. Writes that touch more than one row open
//! their own transaction and commit or roll back as a unit.

pub mod coins;
pub mod subscriptions;
pub mod transactions;
pub mod users;
