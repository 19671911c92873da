use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Login allowed; flipped to false by the lockout threshold
    pub access_granted: bool,
    pub failed_login_attempts: i32,
    /// Forces the password-change flow after the next login
    pub pass_change_req: bool,
    pub role_id: i64,
    pub last_seen: Option<DateTimeUtc>,
    pub creation_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id"
    )]
    Role,
    #[sea_orm(has_many = "super::event_recipient::Entity")]
    EventRecipients,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::event_recipient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventRecipients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
