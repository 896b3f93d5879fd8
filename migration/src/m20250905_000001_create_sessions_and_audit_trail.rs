use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Members {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Trainers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Id,
    MemberId,
    TrainerId,
    SessionType,
    Date,
    TimeIn,
    TimeOut,
    Status,
    Remarks,
    DecidedBy,
    DecidedAt,
    CreatedAt,
    UpdatedAt,
}

/// Append-only; the application never updates or deletes rows.
#[derive(DeriveIden)]
enum AuditTrail {
    Table,
    Id,
    AccountId,
    Username,
    Role,
    Action,
    Details,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::MemberId).integer().not_null())
                    .col(ColumnDef::new(Sessions::TrainerId).integer().null())
                    .col(
                        ColumnDef::new(Sessions::SessionType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sessions::Date).date().not_null())
                    .col(ColumnDef::new(Sessions::TimeIn).time().not_null())
                    .col(ColumnDef::new(Sessions::TimeOut).time().not_null())
                    .col(ColumnDef::new(Sessions::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Sessions::Remarks).string_len(255).null())
                    .col(ColumnDef::new(Sessions::DecidedBy).integer().null())
                    .col(
                        ColumnDef::new(Sessions::DecidedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_member")
                            .from(Sessions::Table, Sessions::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_trainer")
                            .from(Sessions::Table, Sessions::TrainerId)
                            .to(Trainers::Table, Trainers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_member_date")
                    .table(Sessions::Table)
                    .col(Sessions::MemberId)
                    .col(Sessions::Date)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_status")
                    .table(Sessions::Table)
                    .col(Sessions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditTrail::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditTrail::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditTrail::AccountId).integer().null())
                    .col(
                        ColumnDef::new(AuditTrail::Username)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuditTrail::Role).string_len(16).not_null())
                    .col(ColumnDef::new(AuditTrail::Action).string_len(64).not_null())
                    .col(ColumnDef::new(AuditTrail::Details).text().null())
                    .col(
                        ColumnDef::new(AuditTrail::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_audit_trail_created_at")
                    .table(AuditTrail::Table)
                    .col(AuditTrail::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(AuditTrail::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Sessions::Table).to_owned())
            .await?;
        Ok(())
    }
}
