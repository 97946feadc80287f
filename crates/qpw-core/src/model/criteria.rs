// ── Search criteria ──
//
// Plain value describing the filters an operator picked. Mutation is
// whole-value replacement by the caller; nothing here talks to the network.

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::CoreError;
use crate::lookup::{LookupKind, LookupSet};

/// Days covered by the default date range, ending today.
pub const DEFAULT_RANGE_DAYS: u64 = 7;

pub const SENTIMENT_MIN: i32 = -100;
pub const SENTIMENT_MAX: i32 = 100;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaType {
    #[default]
    Voice,
    Chat,
    Email,
    Message,
    Callback,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    #[default]
    Both,
    Inbound,
    Outbound,
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The trailing week ending on `today`.
    pub fn trailing(today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(Days::new(DEFAULT_RANGE_DAYS))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }
}

/// Interaction duration bounds, in seconds. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_seconds: Option<u32>,
}

/// Advanced filters. Each group only means something while its flag is on;
/// values under a disabled flag may linger and must be ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Advanced {
    pub sentiment_enabled: bool,
    pub sentiment_min: i32,
    pub sentiment_max: i32,

    pub topics_enabled: bool,
    pub topics_include: Vec<String>,
    pub topics_exclude: Vec<String>,

    pub categories_enabled: bool,
    pub categories_include: Vec<String>,
    pub categories_exclude: Vec<String>,
}

impl Default for Advanced {
    fn default() -> Self {
        Self {
            sentiment_enabled: false,
            sentiment_min: SENTIMENT_MIN,
            sentiment_max: SENTIMENT_MAX,
            topics_enabled: false,
            topics_include: Vec::new(),
            topics_exclude: Vec::new(),
            categories_enabled: false,
            categories_include: Vec::new(),
            categories_exclude: Vec::new(),
        }
    }
}

/// The full filter set for one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    pub date_range: DateRange,
    pub media_type: MediaType,
    pub direction: Direction,
    #[serde(default)]
    pub duration: DurationBounds,

    #[serde(default)]
    pub queues: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub wrapup_codes: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,

    #[serde(default)]
    pub advanced: Advanced,
}

impl Default for Criteria {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl Criteria {
    /// Initial criteria: last 7 days, voice, both directions, nothing selected.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date_range: DateRange::trailing(today),
            media_type: MediaType::default(),
            direction: Direction::default(),
            duration: DurationBounds::default(),
            queues: Vec::new(),
            users: Vec::new(),
            teams: Vec::new(),
            wrapup_codes: Vec::new(),
            skills: Vec::new(),
            languages: Vec::new(),
            advanced: Advanced::default(),
        }
    }

    /// Copy with every gated group cleared where its flag is off.
    #[must_use]
    pub fn effective(&self) -> Self {
        let mut out = self.clone();
        let adv = &mut out.advanced;
        if !adv.sentiment_enabled {
            adv.sentiment_min = SENTIMENT_MIN;
            adv.sentiment_max = SENTIMENT_MAX;
        }
        if !adv.topics_enabled {
            adv.topics_include.clear();
            adv.topics_exclude.clear();
        }
        if !adv.categories_enabled {
            adv.categories_include.clear();
            adv.categories_exclude.clear();
        }
        out
    }

    /// Id lists that are currently in force, paired with the lookup they
    /// draw from.
    fn id_fields(&self) -> Vec<(&'static str, LookupKind, &[String])> {
        let mut fields = vec![
            ("queues", LookupKind::Queues, self.queues.as_slice()),
            ("users", LookupKind::Users, self.users.as_slice()),
            ("teams", LookupKind::Teams, self.teams.as_slice()),
            ("wrapupCodes", LookupKind::WrapupCodes, self.wrapup_codes.as_slice()),
            ("skills", LookupKind::Skills, self.skills.as_slice()),
            ("languages", LookupKind::Languages, self.languages.as_slice()),
        ];
        let adv = &self.advanced;
        if adv.topics_enabled {
            fields.push(("topicsInclude", LookupKind::Topics, adv.topics_include.as_slice()));
            fields.push(("topicsExclude", LookupKind::Topics, adv.topics_exclude.as_slice()));
        }
        if adv.categories_enabled {
            fields.push((
                "categoriesInclude",
                LookupKind::Categories,
                adv.categories_include.as_slice(),
            ));
            fields.push((
                "categoriesExclude",
                LookupKind::Categories,
                adv.categories_exclude.as_slice(),
            ));
        }
        fields
    }

    /// Check structural bounds and that every selected id came from
    /// `lookups`. Disabled advanced groups are not inspected.
    pub fn validate(&self, lookups: &LookupSet) -> Result<(), CoreError> {
        if self.date_range.start > self.date_range.end {
            return Err(CoreError::validation(
                "dateRange",
                format!(
                    "start {} is after end {}",
                    self.date_range.start, self.date_range.end
                ),
            ));
        }

        if let (Some(min), Some(max)) = (self.duration.min_seconds, self.duration.max_seconds) {
            if min > max {
                return Err(CoreError::validation(
                    "duration",
                    format!("minimum {min}s exceeds maximum {max}s"),
                ));
            }
        }

        let adv = &self.advanced;
        if adv.sentiment_enabled {
            let range = SENTIMENT_MIN..=SENTIMENT_MAX;
            if !range.contains(&adv.sentiment_min) || !range.contains(&adv.sentiment_max) {
                return Err(CoreError::validation(
                    "sentiment",
                    format!("bounds must lie within {SENTIMENT_MIN}..={SENTIMENT_MAX}"),
                ));
            }
            if adv.sentiment_min > adv.sentiment_max {
                return Err(CoreError::validation(
                    "sentiment",
                    format!(
                        "minimum {} exceeds maximum {}",
                        adv.sentiment_min, adv.sentiment_max
                    ),
                ));
            }
        }

        for (field, kind, ids) in self.id_fields() {
            if let Some(unknown) = ids.iter().find(|id| !lookups.contains(kind, id)) {
                return Err(CoreError::validation(
                    field,
                    format!("unknown {kind} id '{unknown}'"),
                ));
            }
        }

        Ok(())
    }
}
