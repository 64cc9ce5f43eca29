use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One row per deployment, keyed by a fixed name. Coordinates and the
        // private scalar are raw big-endian bytes.
        let create_server_keys_sql = r#"
            CREATE TABLE IF NOT EXISTS pushpost.server_keys (
                name VARCHAR(64) PRIMARY KEY,
                x BYTEA NOT NULL,
                y BYTEA NOT NULL,
                d BYTEA NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_server_keys_sql)
            .await?;

        // UNIQUE(user_id) backs the at-most-one-subscription-per-user rule and
        // is the conflict target of the registration upsert.
        let create_subscriptions_sql = r#"
            CREATE TABLE IF NOT EXISTS pushpost.subscriptions (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL REFERENCES pushpost.users(id) ON DELETE CASCADE,
                endpoint TEXT NOT NULL,
                p256dh BYTEA NOT NULL,
                auth BYTEA NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                UNIQUE(user_id)
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_subscriptions_sql)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS pushpost.subscriptions")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS pushpost.server_keys")
            .await?;

        Ok(())
    }
}
