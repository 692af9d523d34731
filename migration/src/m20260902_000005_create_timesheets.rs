use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Timesheet::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Timesheet::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Timesheet::UserId).uuid().not_null())
                    .col(ColumnDef::new(Timesheet::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Timesheet::ActivityId).uuid().not_null())
                    .col(ColumnDef::new(Timesheet::Begin).timestamp().not_null())
                    .col(ColumnDef::new(Timesheet::End).timestamp().null())
                    .col(ColumnDef::new(Timesheet::Timezone).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Timesheet::Duration)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Timesheet::Rate)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Timesheet::FixedRate).double().null())
                    .col(ColumnDef::new(Timesheet::HourlyRate).double().null())
                    .col(
                        ColumnDef::new(Timesheet::Exported)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Timesheet::Description).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_timesheet_user")
                            .from(Timesheet::Table, Timesheet::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_timesheet_project")
                            .from(Timesheet::Table, Timesheet::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_timesheet_activity")
                            .from(Timesheet::Table, Timesheet::ActivityId)
                            .to(Activity::Table, Activity::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_timesheet_user_begin")
                    .table(Timesheet::Table)
                    .col(Timesheet::UserId)
                    .col(Timesheet::Begin)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Timesheet::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Timesheet {
    Table,
    Id,
    UserId,
    ProjectId,
    ActivityId,
    Begin,
    End,
    Timezone,
    Duration,
    Rate,
    FixedRate,
    HourlyRate,
    Exported,
    Description,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Project {
    Table,
    Id,
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
}
