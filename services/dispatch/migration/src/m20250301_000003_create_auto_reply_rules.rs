use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AutoReplyRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AutoReplyRules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AutoReplyRules::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(AutoReplyRules::RuleType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AutoReplyRules::Name).string().not_null())
                    .col(
                        ColumnDef::new(AutoReplyRules::Keywords)
                            .array(ColumnType::Text)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AutoReplyRules::MatchType).string_len(16))
                    .col(ColumnDef::new(AutoReplyRules::ReplyMessage).text().not_null())
                    .col(
                        ColumnDef::new(AutoReplyRules::IsEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AutoReplyRules::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AutoReplyRules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AutoReplyRules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AutoReplyRules::Table, AutoReplyRules::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(AutoReplyRules::Table)
                    .col(AutoReplyRules::TenantId)
                    .col(AutoReplyRules::Priority)
                    .name("idx_auto_reply_rules_tenant_id_priority")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AutoReplyRules::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AutoReplyRules {
    Table,
    Id,
    TenantId,
    RuleType,
    Name,
    Keywords,
    MatchType,
    ReplyMessage,
    IsEnabled,
    Priority,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tenants {
    Table,
    Id,
}
