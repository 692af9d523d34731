use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activity::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // NULL = global activity, usable by every project
                    .col(ColumnDef::new(Activity::ProjectId).uuid().null())
                    .col(ColumnDef::new(Activity::Name).string_len(150).not_null())
                    .col(ColumnDef::new(Activity::Comment).text().null())
                    .col(
                        ColumnDef::new(Activity::Visible)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Activity::Budget)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Activity::FixedRate).double().null())
                    .col(ColumnDef::new(Activity::HourlyRate).double().null())
                    .col(
                        ColumnDef::new(Activity::Synthesized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Activity::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_project")
                            .from(Activity::Table, Activity::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
    ProjectId,
    Name,
    Comment,
    Visible,
    Budget,
    FixedRate,
    HourlyRate,
    Synthesized,
    CreatedAt,
}

#[derive(Iden)]
enum Project {
    Table,
    Id,
}
