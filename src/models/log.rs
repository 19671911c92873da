use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "logs")]
#[schema(as = LogEntry)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Channel: `main`, `auth` or `admin`
    pub log_name: String,
    pub level: String,
    pub msg: String,
    #[schema(value_type = String)]
    pub time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
