use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let create_users_sql = r#"
            CREATE TABLE IF NOT EXISTS pushpost.users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                name VARCHAR(255) NOT NULL UNIQUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_users_sql)
            .await?;

        let create_posts_sql = r#"
            CREATE TABLE IF NOT EXISTS pushpost.posts (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL REFERENCES pushpost.users(id) ON DELETE CASCADE,
                author VARCHAR(255) NOT NULL,
                text TEXT NOT NULL,
                time TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_posts_sql)
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_posts_time ON pushpost.posts(time DESC)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS pushpost.posts")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS pushpost.users")
            .await?;

        Ok(())
    }
}
