use sea_orm::entity::prelude::*;

/// Operator account; `channel_destination` is the id the channel provider
/// puts in webhook callbacks.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub channel_destination: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::messages::Entity")]
    Messages,
    #[sea_orm(has_many = "super::auto_reply_rules::Entity")]
    AutoReplyRules,
}

impl Related<super::messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl Related<super::auto_reply_rules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AutoReplyRules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
