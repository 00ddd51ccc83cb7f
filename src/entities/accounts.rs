use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    pub nickname: Option<String>,

    /// Argon2id PHC string
    pub password_hash: String,

    #[sea_orm(unique)]
    pub email: Option<String>,

    pub is_admin: bool,

    pub is_active: bool,

    /// Consecutive failed password attempts since the last success.
    pub failed_login_attempts: i32,

    pub locked_until: Option<DateTimeUtc>,

    pub theme: String,

    pub notifications_enabled: bool,

    pub preferred_language: String,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    pub last_login_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
