use chrono::{DateTime, Duration, TimeZone, Utc};
use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

pub const MAX_PURGE: u16 = 200;
const BULK_DELETE_MAX: usize = 100;
const BULK_DELETE_MAX_AGE_DAYS: i64 = 14;
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeTarget {
    Everyone,
    User(serenity::UserId),
    Bot(serenity::UserId),
}

impl PurgeTarget {
    pub fn matches(&self, author_id: serenity::UserId, author_is_bot: bool) -> bool {
        match self {
            PurgeTarget::Everyone => true,
            PurgeTarget::User(id) => *id == author_id && !author_is_bot,
            PurgeTarget::Bot(id) => *id == author_id && author_is_bot,
        }
    }
}

/// Messages split by how Discord lets us delete them.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeletionPlan {
    pub bulk: Vec<Vec<serenity::MessageId>>,
    pub single: Vec<serenity::MessageId>,
}

impl DeletionPlan {
    pub fn total(&self) -> usize {
        self.bulk.iter().map(Vec::len).sum::<usize>() + self.single.len()
    }
}

pub fn snowflake_time(id: serenity::MessageId) -> DateTime<Utc> {
    let millis = (id.get() >> 22) + DISCORD_EPOCH_MS;
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Bulk delete only takes 2..=100 ids younger than two weeks; everything
/// else goes one by one.
pub fn plan_deletions(ids: &[serenity::MessageId], now: DateTime<Utc>) -> DeletionPlan {
    let cutoff = now - Duration::days(BULK_DELETE_MAX_AGE_DAYS);
    let (recent, old): (Vec<_>, Vec<_>) = ids
        .iter()
        .copied()
        .partition(|id| snowflake_time(*id) > cutoff);

    let mut plan = DeletionPlan {
        bulk: Vec::new(),
        single: old,
    };

    for chunk in recent.chunks(BULK_DELETE_MAX) {
        if chunk.len() == 1 {
            plan.single.push(chunk[0]);
        } else {
            plan.bulk.push(chunk.to_vec());
        }
    }

    plan
}

/// Looks at the `scan_limit` most recent messages and deletes those matching
/// `target`. Returns how many were deleted.
pub async fn purge_channel(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    scan_limit: usize,
    target: PurgeTarget,
) -> Result<usize, serenity::Error> {
    let mut matched = Vec::new();
    let mut scanned = 0;
    let mut before: Option<serenity::MessageId> = None;

    while scanned < scan_limit {
        let page = (scan_limit - scanned).min(BULK_DELETE_MAX) as u8;
        let mut request = serenity::GetMessages::new().limit(page);
        if let Some(before) = before {
            request = request.before(before);
        }

        let messages = channel_id.messages(http, request).await?;
        if messages.is_empty() {
            break;
        }

        scanned += messages.len();
        before = messages.last().map(|m| m.id);
        matched.extend(
            messages
                .iter()
                .filter(|m| target.matches(m.author.id, m.author.bot))
                .map(|m| m.id),
        );

        if messages.len() < page as usize {
            break;
        }
    }

    let plan = plan_deletions(&matched, Utc::now());
    debug!(channel_id = %channel_id, scanned, matched = plan.total(), "purging messages");

    let mut deleted = 0;
    for chunk in &plan.bulk {
        channel_id.delete_messages(http, chunk).await?;
        deleted += chunk.len();
    }

    for id in &plan.single {
        match channel_id.delete_message(http, *id).await {
            Ok(()) => deleted += 1,
            Err(e) => warn!(channel_id = %channel_id, message_id = %id, error = %e, "could not delete message"),
        }
    }

    Ok(deleted)
}
