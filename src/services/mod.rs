pub mod password;
pub mod validation;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{
    AccountError, AccountFilter, AccountInfo, AccountService, AccountStats, AccountUpdate,
    NewAccount, PreferencesUpdate, ProfileUpdate,
};
pub use account_service_impl::SeaOrmAccountService;

pub mod settings_service;
pub mod settings_service_impl;
pub use settings_service::{SettingEntry, SettingValue, SettingsError, SettingsService};
pub use settings_service_impl::SeaOrmSettingsService;
