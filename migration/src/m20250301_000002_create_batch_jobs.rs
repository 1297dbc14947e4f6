use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BatchJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BatchJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BatchJobs::Status).string().not_null())
                    .col(ColumnDef::new(BatchJobs::TotalTasks).integer().not_null())
                    .col(
                        ColumnDef::new(BatchJobs::CompletedTasks)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BatchJobs::FailedTasks)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(BatchJobs::WebhookUrl).string())
                    .col(ColumnDef::new(BatchJobs::Results).json_binary())
                    .col(ColumnDef::new(BatchJobs::Error).text())
                    .col(ColumnDef::new(BatchJobs::ProcessingTime).double())
                    .col(
                        ColumnDef::new(BatchJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BatchJobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(BatchJobs::CompletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_batch_jobs_status")
                    .table(BatchJobs::Table)
                    .col(BatchJobs::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BatchJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BatchJobs {
    Table,
    Id,
    Status,
    TotalTasks,
    CompletedTasks,
    FailedTasks,
    WebhookUrl,
    Results,
    Error,
    ProcessingTime,
    CreatedAt,
    UpdatedAt,
    CompletedAt,
}
