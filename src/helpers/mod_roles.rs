use poise::serenity_prelude as serenity;
use sqlx::SqlitePool;

use crate::structs::guild_config::GuildConfig;

pub async fn init_guild_config_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guild_config (
            guild_id TEXT PRIMARY KEY,
            mod_role_id TEXT NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_mod_role(pool: &SqlitePool, guild_id: u64, role_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO guild_config (guild_id, mod_role_id)
        VALUES (?, ?)
        ON CONFLICT(guild_id) DO UPDATE SET mod_role_id = excluded.mod_role_id
        "#,
    )
        .bind(guild_id.to_string())
        .bind(role_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_mod_role(pool: &SqlitePool, guild_id: u64) -> Result<Option<serenity::RoleId>, sqlx::Error> {
    let config = sqlx::query_as::<_, GuildConfig>(
        r#"
        SELECT mod_role_id FROM guild_config WHERE guild_id = ?
        "#,
    )
        .bind(guild_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(config.and_then(|c| c.mod_role()).map(serenity::RoleId::new))
}

/// Interaction members carry resolved permissions. Prefix commands only
/// get them by computing from the cached guild.
pub fn is_administrator(
    resolved: Option<serenity::Permissions>,
    from_guild: Option<serenity::Permissions>,
) -> bool {
    resolved.or(from_guild).is_some_and(|p| p.administrator())
}

/// Owner and administrators always pass; everyone else needs the guild's
/// moderator role.
pub fn has_mod_access(
    is_owner: bool,
    is_admin: bool,
    member_roles: &[serenity::RoleId],
    mod_role: Option<serenity::RoleId>,
) -> bool {
    if is_owner || is_admin {
        return true;
    }

    mod_role.is_some_and(|role| member_roles.contains(&role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_guild_config_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn unset_guild_has_no_mod_role() {
        let pool = pool().await;
        assert_eq!(get_mod_role(&pool, 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn setting_twice_keeps_latest() {
        let pool = pool().await;
        set_mod_role(&pool, 1, 1_308_891_968_004_292_618).await.unwrap();
        set_mod_role(&pool, 1, 42).await.unwrap();
        set_mod_role(&pool, 2, 7).await.unwrap();

        assert_eq!(get_mod_role(&pool, 1).await.unwrap(), Some(serenity::RoleId::new(42)));
        assert_eq!(get_mod_role(&pool, 2).await.unwrap(), Some(serenity::RoleId::new(7)));
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let pool = pool().await;
        set_mod_role(&pool, 1, 5).await.unwrap();
        init_guild_config_table(&pool).await.unwrap();
        assert_eq!(get_mod_role(&pool, 1).await.unwrap(), Some(serenity::RoleId::new(5)));
    }

    #[test]
    fn prefix_admin_passes_from_guild_permissions() {
        let admin = serenity::Permissions::ADMINISTRATOR;
        let plain = serenity::Permissions::SEND_MESSAGES;

        let is_admin = is_administrator(None, Some(admin));
        assert!(is_admin);
        assert!(has_mod_access(false, is_admin, &[], None));

        assert!(!is_administrator(None, Some(plain)));
        assert!(!is_administrator(None, None));
        assert!(is_administrator(Some(admin), None));
        assert!(!is_administrator(Some(plain), Some(plain)));
    }

    #[test]
    fn access_rules() {
        let mod_role = serenity::RoleId::new(10);
        let other = serenity::RoleId::new(11);

        assert!(has_mod_access(true, false, &[], None));
        assert!(has_mod_access(false, true, &[], None));
        assert!(has_mod_access(false, false, &[other, mod_role], Some(mod_role)));
        assert!(!has_mod_access(false, false, &[other], Some(mod_role)));
        assert!(!has_mod_access(false, false, &[mod_role], None));
    }
}
