use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrackedDriver {
    pub cust_id: i64,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct GuildChannel {
    pub guild_id: i64,
    pub channel_id: i64,
}

pub async fn add_tracked_driver(
    cust_id: i64,
    display_name: &str,
    pool: &SqlitePool,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tracked_drivers ( cust_id, display_name )
        VALUES ( ?1, ?2 )
        ON CONFLICT(cust_id)
        DO UPDATE SET
            display_name = excluded.display_name
        "#,
    )
    .bind(cust_id)
    .bind(display_name)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns whether the driver was actually tracked.
pub async fn remove_tracked_driver(cust_id: i64, pool: &SqlitePool) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM tracked_drivers WHERE cust_id = ?1")
        .bind(cust_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn is_tracked(cust_id: i64, pool: &SqlitePool) -> anyhow::Result<bool> {
    let row: Option<i64> = sqlx::query_scalar("SELECT 1 FROM tracked_drivers WHERE cust_id = ?1")
        .bind(cust_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

pub async fn list_tracked(pool: &SqlitePool) -> anyhow::Result<Vec<TrackedDriver>> {
    Ok(sqlx::query_as::<_, TrackedDriver>(
        "SELECT cust_id, display_name FROM tracked_drivers ORDER BY added_at",
    )
    .fetch_all(pool)
    .await?)
}

pub async fn set_channel_for_guild(
    guild_id: i64,
    channel_id: i64,
    pool: &SqlitePool,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO channel_config ( guild_id, channel_id )
        VALUES ( ?1, ?2 )
        ON CONFLICT(guild_id)
        DO UPDATE SET
            channel_id = excluded.channel_id
        "#,
    )
    .bind(guild_id)
    .bind(channel_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_channel_for_guild(
    guild_id: i64,
    pool: &SqlitePool,
) -> anyhow::Result<Option<i64>> {
    Ok(
        sqlx::query_scalar("SELECT channel_id FROM channel_config WHERE guild_id = ?1")
            .bind(guild_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn list_guilds_with_channel(pool: &SqlitePool) -> anyhow::Result<Vec<GuildChannel>> {
    Ok(sqlx::query_as::<_, GuildChannel>(
        "SELECT guild_id, channel_id FROM channel_config ORDER BY guild_id",
    )
    .fetch_all(pool)
    .await?)
}

pub async fn get_last_poll_ts(cust_id: i64, pool: &SqlitePool) -> anyhow::Result<Option<i64>> {
    Ok(
        sqlx::query_scalar("SELECT last_poll_ts FROM poll_state WHERE cust_id = ?1")
            .bind(cust_id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Advance the poll watermark. The stored value never moves backwards, even
/// when cycles race each other.
pub async fn set_last_poll_ts(cust_id: i64, ts: i64, pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO poll_state ( cust_id, last_poll_ts )
        VALUES ( ?1, ?2 )
        ON CONFLICT(cust_id)
        DO UPDATE SET
            last_poll_ts = MAX(last_poll_ts, excluded.last_poll_ts)
        "#,
    )
    .bind(cust_id)
    .bind(ts)
    .execute(pool)
    .await?;

    Ok(())
}

/// Atomically claim a (subsession, driver, guild) delivery. Returns true
/// exactly once per triple, so a post can never be duplicated even when
/// cycles overlap.
pub async fn try_mark_posted(
    subsession_id: i64,
    cust_id: i64,
    guild_id: i64,
    pool: &SqlitePool,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO posted_results ( subsession_id, cust_id, guild_id )
        VALUES ( ?1, ?2, ?3 )
        ON CONFLICT(subsession_id, cust_id, guild_id)
        DO NOTHING
        "#,
    )
    .bind(subsession_id)
    .bind(cust_id)
    .bind(guild_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn was_posted(
    subsession_id: i64,
    cust_id: i64,
    guild_id: i64,
    pool: &SqlitePool,
) -> anyhow::Result<bool> {
    let row: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM posted_results WHERE subsession_id = ?1 AND cust_id = ?2 AND guild_id = ?3",
    )
    .bind(subsession_id)
    .bind(cust_id)
    .bind(guild_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn mark_posted_round_trip() {
        let pool = test_pool().await;

        assert!(try_mark_posted(789012, 123456, 42, &pool).await.unwrap());
        assert!(was_posted(789012, 123456, 42, &pool).await.unwrap());

        // Any other key stays unposted.
        assert!(!was_posted(789013, 123456, 42, &pool).await.unwrap());
        assert!(!was_posted(789012, 123457, 42, &pool).await.unwrap());
        assert!(!was_posted(789012, 123456, 43, &pool).await.unwrap());

        // The claim only succeeds once.
        assert!(!try_mark_posted(789012, 123456, 42, &pool).await.unwrap());
    }

    #[tokio::test]
    async fn watermark_never_moves_backwards() {
        let pool = test_pool().await;

        assert_eq!(get_last_poll_ts(1, &pool).await.unwrap(), None);

        set_last_poll_ts(1, 100, &pool).await.unwrap();
        assert_eq!(get_last_poll_ts(1, &pool).await.unwrap(), Some(100));

        set_last_poll_ts(1, 50, &pool).await.unwrap();
        assert_eq!(get_last_poll_ts(1, &pool).await.unwrap(), Some(100));

        set_last_poll_ts(1, 200, &pool).await.unwrap();
        assert_eq!(get_last_poll_ts(1, &pool).await.unwrap(), Some(200));
    }

    #[tokio::test]
    async fn tracked_driver_upsert_and_remove() {
        let pool = test_pool().await;

        add_tracked_driver(123456, "Test Driver", &pool).await.unwrap();
        add_tracked_driver(123456, "Renamed Driver", &pool)
            .await
            .unwrap();

        let tracked = list_tracked(&pool).await.unwrap();
        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].display_name, "Renamed Driver");
        assert!(is_tracked(123456, &pool).await.unwrap());

        assert!(remove_tracked_driver(123456, &pool).await.unwrap());
        assert!(!remove_tracked_driver(123456, &pool).await.unwrap());
        assert!(!is_tracked(123456, &pool).await.unwrap());
    }

    #[tokio::test]
    async fn channel_config_is_overwritten() {
        let pool = test_pool().await;

        assert_eq!(get_channel_for_guild(42, &pool).await.unwrap(), None);

        set_channel_for_guild(42, 7, &pool).await.unwrap();
        set_channel_for_guild(42, 8, &pool).await.unwrap();
        set_channel_for_guild(43, 9, &pool).await.unwrap();

        assert_eq!(get_channel_for_guild(42, &pool).await.unwrap(), Some(8));

        let guilds = list_guilds_with_channel(&pool).await.unwrap();
        assert_eq!(guilds.len(), 2);
        assert_eq!(guilds[0].guild_id, 42);
        assert_eq!(guilds[0].channel_id, 8);
    }
}
