use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Members {
    Table,
    Id,
    MembershipType,
    MembershipStart,
    MembershipEnd,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
}

/// One row per paid plan; a member's coverage is the union of their periods.
#[derive(DeriveIden)]
enum MembershipPeriods {
    Table,
    Id,
    MemberId,
    MembershipType,
    StartDate,
    EndDate,
    TransactionId,
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
                    .table(MembershipPeriods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MembershipPeriods::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MembershipPeriods::MemberId).integer().not_null())
                    .col(
                        ColumnDef::new(MembershipPeriods::MembershipType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MembershipPeriods::StartDate).date().not_null())
                    .col(ColumnDef::new(MembershipPeriods::EndDate).date().not_null())
                    .col(ColumnDef::new(MembershipPeriods::TransactionId).integer().null())
                    .col(
                        ColumnDef::new(MembershipPeriods::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_membership_periods_member")
                            .from(MembershipPeriods::Table, MembershipPeriods::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_membership_periods_transaction")
                            .from(MembershipPeriods::Table, MembershipPeriods::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_membership_periods_member_dates")
                    .table(MembershipPeriods::Table)
                    .col(MembershipPeriods::MemberId)
                    .col(MembershipPeriods::StartDate)
                    .col(MembershipPeriods::EndDate)
                    .to_owned(),
            )
            .await?;

        // existing members get their current coverage as a single period
        let current = Query::select()
            .columns([
                Members::Id,
                Members::MembershipType,
                Members::MembershipStart,
                Members::MembershipEnd,
                Members::CreatedAt,
            ])
            .from(Members::Table)
            .to_owned();
        let backfill = Query::insert()
            .into_table(MembershipPeriods::Table)
            .columns([
                MembershipPeriods::MemberId,
                MembershipPeriods::MembershipType,
                MembershipPeriods::StartDate,
                MembershipPeriods::EndDate,
                MembershipPeriods::CreatedAt,
            ])
            .select_from(current)
            .map_err(|e| DbErr::Migration(e.to_string()))?
            .to_owned();
        manager.exec_stmt(backfill).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(MembershipPeriods::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
