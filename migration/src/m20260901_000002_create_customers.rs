use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customer::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customer::Name).string_len(150).not_null())
                    .col(ColumnDef::new(Customer::Company).string().null())
                    .col(ColumnDef::new(Customer::Contact).string().null())
                    .col(ColumnDef::new(Customer::Address).text().null())
                    .col(ColumnDef::new(Customer::Country).string_len(2).not_null())
                    .col(ColumnDef::new(Customer::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Customer::Timezone).string_len(64).not_null())
                    .col(ColumnDef::new(Customer::Email).string().null())
                    .col(ColumnDef::new(Customer::Phone).string().null())
                    .col(ColumnDef::new(Customer::Fax).string().null())
                    .col(ColumnDef::new(Customer::Mobile).string().null())
                    .col(ColumnDef::new(Customer::Homepage).string().null())
                    .col(ColumnDef::new(Customer::Comment).text().null())
                    .col(
                        ColumnDef::new(Customer::Visible)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Customer::Synthesized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Customer::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Customer::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Customer {
    Table,
    Id,
    Name,
    Company,
    Contact,
    Address,
    Country,
    Currency,
    Timezone,
    Email,
    Phone,
    Fax,
    Mobile,
    Homepage,
    Comment,
    Visible,
    Synthesized,
    CreatedAt,
}
