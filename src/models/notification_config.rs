use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Desired recurrence of the notification sweep; a single seeded row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_config")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub notify_unit: String,
    pub notify_interval: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
