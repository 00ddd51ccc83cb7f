pub use super::accounts::Entity as Accounts;
pub use super::settings::Entity as Settings;
