pub mod account;
pub mod setting;
