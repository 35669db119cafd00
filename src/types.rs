use std::sync::Arc;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::helpers::sticky_manager::StickyService;


pub struct Data {
    pub db: SqlitePool,
    pub stickies: Arc<StickyService>,
    pub config: Arc<Config>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub type Context<'a> = poise::Context<'a, Data, Error>;
