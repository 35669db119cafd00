use std::collections::HashMap;

use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use thiserror::Error;

use crate::structs::sticky_message::{StickyContent, StickyRecord};

/// Non-bot messages needed before a sticky is moved back to the bottom.
pub const REPOST_THRESHOLD: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("channel {0} already has a sticky message")]
    AlreadyExists(serenity::ChannelId),
    #[error("channel {0} has no sticky message")]
    NotFound(serenity::ChannelId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickyState {
    Idle,
    Armed,
    Due,
}

/// Returned by [`StickyRegistry::record_message`] when the caller has to
/// repost. Carries a snapshot of the record as it was when the trigger fired.
#[derive(Debug, Clone, PartialEq)]
pub struct RepostDecision {
    pub should_repost: bool,
    pub record: StickyRecord,
}

#[derive(Debug, Default)]
pub struct StickyRegistry {
    stickies: HashMap<serenity::ChannelId, StickyRecord>,
    enforce_cooldown: bool,
}

impl StickyRegistry {
    pub fn new(enforce_cooldown: bool) -> Self {
        Self {
            stickies: HashMap::new(),
            enforce_cooldown,
        }
    }

    pub fn with_records(records: impl IntoIterator<Item = StickyRecord>, enforce_cooldown: bool) -> Self {
        let mut registry = Self::new(enforce_cooldown);
        registry
            .stickies
            .extend(records.into_iter().map(|record| (record.channel_id, record)));
        registry
    }

    pub fn create(
        &mut self,
        channel_id: serenity::ChannelId,
        message_id: serenity::MessageId,
        name: String,
        content: StickyContent,
        cooldown_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<StickyRecord, RegistryError> {
        if self.stickies.contains_key(&channel_id) {
            return Err(RegistryError::AlreadyExists(channel_id));
        }

        let record = StickyRecord {
            channel_id,
            message_id,
            name,
            content,
            message_count: 0,
            cooldown_seconds,
            last_sent_at: now,
        };
        self.stickies.insert(channel_id, record.clone());
        Ok(record)
    }

    pub fn remove(&mut self, channel_id: serenity::ChannelId) -> Result<StickyRecord, RegistryError> {
        self.stickies
            .remove(&channel_id)
            .ok_or(RegistryError::NotFound(channel_id))
    }

    pub fn get(&self, channel_id: serenity::ChannelId) -> Option<&StickyRecord> {
        self.stickies.get(&channel_id)
    }

    pub fn state(&self, channel_id: serenity::ChannelId) -> StickyState {
        match self.stickies.get(&channel_id) {
            None => StickyState::Idle,
            Some(record) if record.message_count >= REPOST_THRESHOLD => StickyState::Due,
            Some(_) => StickyState::Armed,
        }
    }

    /// Counts one non-bot message. Channels without a sticky are ignored.
    ///
    /// With cooldown enforcement on, a record that reached the threshold
    /// stays due until `cooldown_seconds` have passed since the last send.
    pub fn record_message(&mut self, channel_id: serenity::ChannelId, now: DateTime<Utc>) -> Option<RepostDecision> {
        let record = self.stickies.get_mut(&channel_id)?;
        record.message_count = record.message_count.saturating_add(1);

        if self.state(channel_id) != StickyState::Due {
            return None;
        }

        let record = self.stickies.get(&channel_id)?;
        if self.enforce_cooldown {
            // a negative elapsed time counts as still cooling down
            let elapsed = now.signed_duration_since(record.last_sent_at).num_seconds();
            let cooled = u64::try_from(elapsed).is_ok_and(|secs| secs >= record.cooldown_seconds);
            if !cooled {
                return None;
            }
        }

        Some(RepostDecision {
            should_repost: true,
            record: record.clone(),
        })
    }

    pub fn repost(
        &mut self,
        channel_id: serenity::ChannelId,
        new_message_id: serenity::MessageId,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let record = self
            .stickies
            .get_mut(&channel_id)
            .ok_or(RegistryError::NotFound(channel_id))?;

        record.message_id = new_message_id;
        record.message_count = 0;
        record.last_sent_at = now;
        Ok(())
    }

    /// All records ordered by channel id.
    pub fn records(&self) -> Vec<StickyRecord> {
        let mut records: Vec<StickyRecord> = self.stickies.values().cloned().collect();
        records.sort_by_key(|record| record.channel_id);
        records
    }

    pub fn len(&self) -> usize {
        self.stickies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::sticky_message::EmbedContent;
    use chrono::Duration;

    fn channel(id: u64) -> serenity::ChannelId {
        serenity::ChannelId::new(id)
    }

    fn message(id: u64) -> serenity::MessageId {
        serenity::MessageId::new(id)
    }

    fn armed(registry: &mut StickyRegistry, channel_id: serenity::ChannelId, now: DateTime<Utc>) {
        registry
            .create(channel_id, message(1), "Rules".into(), StickyContent::Plain("Be nice".into()), 1, now)
            .unwrap();
    }

    #[test]
    fn create_then_get_starts_at_zero() {
        let mut registry = StickyRegistry::default();
        let embed = StickyContent::Embed(EmbedContent {
            title: Some("Welcome".into()),
            description: "Read the rules".into(),
            color: "green".into(),
        });
        registry
            .create(channel(1), message(11), "welcome".into(), embed, 5, Utc::now())
            .unwrap();

        let record = registry.get(channel(1)).unwrap();
        assert_eq!(record.message_count, 0);
        assert!(record.is_embed());
        assert_eq!(registry.state(channel(1)), StickyState::Armed);
    }

    #[test]
    fn create_twice_keeps_the_first_record() {
        let mut registry = StickyRegistry::default();
        let now = Utc::now();
        armed(&mut registry, channel(1), now);

        let err = registry
            .create(channel(1), message(2), "Other".into(), StickyContent::Plain("x".into()), 1, now)
            .unwrap_err();

        assert_eq!(err, RegistryError::AlreadyExists(channel(1)));
        let record = registry.get(channel(1)).unwrap();
        assert_eq!(record.name, "Rules");
        assert_eq!(record.message_id, message(1));
    }

    #[test]
    fn one_message_stays_armed_two_become_due() {
        let mut registry = StickyRegistry::default();
        let now = Utc::now();
        armed(&mut registry, channel(1), now);

        assert!(registry.record_message(channel(1), now).is_none());
        assert_eq!(registry.state(channel(1)), StickyState::Armed);

        let decision = registry.record_message(channel(1), now).unwrap();
        assert!(decision.should_repost);
        assert_eq!(decision.record.message_count, 2);
        assert_eq!(registry.state(channel(1)), StickyState::Due);
    }

    #[test]
    fn messages_in_other_channels_are_ignored() {
        let mut registry = StickyRegistry::default();
        let now = Utc::now();
        armed(&mut registry, channel(1), now);

        assert!(registry.record_message(channel(2), now).is_none());
        assert!(registry.record_message(channel(2), now).is_none());
        assert_eq!(registry.get(channel(1)).unwrap().message_count, 0);
        assert_eq!(registry.state(channel(2)), StickyState::Idle);
    }

    #[test]
    fn repost_resets_counter_and_message() {
        let mut registry = StickyRegistry::default();
        let start = Utc::now();
        armed(&mut registry, channel(1), start);
        registry.record_message(channel(1), start);
        registry.record_message(channel(1), start);

        let later = start + Duration::seconds(30);
        registry.repost(channel(1), message(42), later).unwrap();

        let record = registry.get(channel(1)).unwrap();
        assert_eq!(record.message_count, 0);
        assert_eq!(record.message_id, message(42));
        assert_eq!(record.last_sent_at, later);
        assert_eq!(registry.state(channel(1)), StickyState::Armed);
    }

    #[test]
    fn repost_without_record_is_not_found() {
        let mut registry = StickyRegistry::default();
        assert_eq!(
            registry.repost(channel(3), message(1), Utc::now()),
            Err(RegistryError::NotFound(channel(3)))
        );
    }

    #[test]
    fn remove_returns_record_and_goes_idle() {
        let mut registry = StickyRegistry::default();
        armed(&mut registry, channel(1), Utc::now());

        let removed = registry.remove(channel(1)).unwrap();
        assert_eq!(removed.name, "Rules");
        assert_eq!(registry.state(channel(1)), StickyState::Idle);
        assert_eq!(registry.remove(channel(1)), Err(RegistryError::NotFound(channel(1))));
    }

    #[test]
    fn failed_repost_keeps_triggering() {
        let mut registry = StickyRegistry::default();
        let now = Utc::now();
        armed(&mut registry, channel(1), now);
        registry.record_message(channel(1), now);
        registry.record_message(channel(1), now);

        // no repost recorded, next message fires again
        assert!(registry.record_message(channel(1), now).is_some());
    }

    #[test]
    fn enforced_cooldown_holds_due_record() {
        let mut registry = StickyRegistry::new(true);
        let start = Utc::now();
        registry
            .create(channel(1), message(1), "slow".into(), StickyContent::Plain("x".into()), 60, start)
            .unwrap();

        registry.record_message(channel(1), start);
        assert!(registry.record_message(channel(1), start + Duration::seconds(10)).is_none());
        assert_eq!(registry.state(channel(1)), StickyState::Due);

        assert!(registry.record_message(channel(1), start + Duration::seconds(61)).is_some());
    }

    #[test]
    fn enforced_cooldown_handles_huge_values() {
        let mut registry = StickyRegistry::new(true);
        let start = Utc::now();
        registry
            .create(channel(1), message(1), "forever".into(), StickyContent::Plain("x".into()), u64::MAX, start)
            .unwrap();

        registry.record_message(channel(1), start);
        assert!(registry.record_message(channel(1), start + Duration::seconds(1)).is_none());
        assert!(registry.record_message(channel(1), start + Duration::days(365 * 100)).is_none());
        assert_eq!(registry.state(channel(1)), StickyState::Due);
    }

    #[test]
    fn enforced_cooldown_waits_when_clock_goes_backwards() {
        let mut registry = StickyRegistry::new(true);
        let start = Utc::now();
        registry
            .create(channel(1), message(1), "skew".into(), StickyContent::Plain("x".into()), 1, start)
            .unwrap();

        registry.record_message(channel(1), start);
        assert!(registry.record_message(channel(1), start - Duration::seconds(5)).is_none());
        assert!(registry.record_message(channel(1), start + Duration::seconds(2)).is_some());
    }

    #[test]
    fn cooldown_is_ignored_unless_enforced() {
        let mut registry = StickyRegistry::new(false);
        let start = Utc::now();
        registry
            .create(channel(1), message(1), "slow".into(), StickyContent::Plain("x".into()), 600, start)
            .unwrap();

        registry.record_message(channel(1), start);
        assert!(registry.record_message(channel(1), start).is_some());
    }

    #[test]
    fn records_are_sorted_by_channel() {
        let now = Utc::now();
        let mut registry = StickyRegistry::default();
        armed(&mut registry, channel(30), now);
        armed(&mut registry, channel(10), now);
        armed(&mut registry, channel(20), now);

        let ids: Vec<u64> = registry.records().iter().map(|r| r.channel_id.get()).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(registry.len(), 3);
    }
}
