pub mod commerce;
pub mod user;
