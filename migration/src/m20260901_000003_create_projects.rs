use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Project::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Project::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Project::Name).string_len(150).not_null())
                    .col(ColumnDef::new(Project::Comment).text().null())
                    .col(
                        ColumnDef::new(Project::Visible)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Project::Budget)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Project::FixedRate).double().null())
                    .col(ColumnDef::new(Project::HourlyRate).double().null())
                    .col(
                        ColumnDef::new(Project::Synthesized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Project::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_customer")
                            .from(Project::Table, Project::CustomerId)
                            .to(Customer::Table, Customer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Project {
    Table,
    Id,
    CustomerId,
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
enum Customer {
    Table,
    Id,
}
