use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct GuildConfig {
    pub mod_role_id: String,
}

impl GuildConfig {
    pub fn mod_role(&self) -> Option<u64> {
        self.mod_role_id.parse::<u64>().ok().filter(|id| *id != 0)
    }
}
