// ── Lookup aggregation ──
//
// Eight reference-data resources are walked concurrently and normalised
// into `LookupOption`s. The merged set is committed only when every walk
// succeeded; any failure resets all eight lists to empty.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures_util::future::join_all;
use qpw_api::{ApiClient, QueryParams, WalkOptions};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::LookupOption;

// ── Kinds & table ────────────────────────────────────────────────────

/// The reference-data domains a criteria form selects from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LookupKind {
    Users,
    Queues,
    Skills,
    Languages,
    Teams,
    WrapupCodes,
    Topics,
    Categories,
}

/// How one lookup resource is fetched and labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupSpec {
    pub kind: LookupKind,
    pub path: &'static str,
    pub page_size: u32,
    /// Fixed filters sent with every page.
    pub params: &'static [(&'static str, &'static str)],
    /// Label fallback chain; the id is the implicit last resort.
    pub label_fields: &'static [&'static str],
}

const NAME_ONLY: &[&str] = &["name"];

pub static LOOKUP_SPECS: [LookupSpec; 8] = [
    LookupSpec {
        kind: LookupKind::Users,
        path: "/api/v2/users",
        page_size: 100,
        params: &[("state", "active")],
        label_fields: &["name", "username", "email"],
    },
    LookupSpec {
        kind: LookupKind::Queues,
        path: "/api/v2/routing/queues",
        page_size: 100,
        params: &[],
        label_fields: NAME_ONLY,
    },
    LookupSpec {
        kind: LookupKind::Skills,
        path: "/api/v2/routing/skills",
        page_size: 100,
        params: &[],
        label_fields: NAME_ONLY,
    },
    LookupSpec {
        kind: LookupKind::Languages,
        path: "/api/v2/routing/languages",
        page_size: 100,
        params: &[],
        label_fields: NAME_ONLY,
    },
    LookupSpec {
        kind: LookupKind::Teams,
        path: "/api/v2/teams",
        page_size: 100,
        params: &[],
        label_fields: NAME_ONLY,
    },
    LookupSpec {
        kind: LookupKind::WrapupCodes,
        path: "/api/v2/routing/wrapupcodes",
        page_size: 100,
        params: &[],
        label_fields: NAME_ONLY,
    },
    LookupSpec {
        kind: LookupKind::Topics,
        path: "/api/v2/speechandtextanalytics/topics",
        page_size: 100,
        params: &[],
        label_fields: NAME_ONLY,
    },
    LookupSpec {
        kind: LookupKind::Categories,
        path: "/api/v2/speechandtextanalytics/categories",
        page_size: 100,
        params: &[],
        label_fields: NAME_ONLY,
    },
];

impl LookupKind {
    pub fn spec(self) -> &'static LookupSpec {
        let idx = LOOKUP_SPECS
            .iter()
            .position(|s| s.kind == self)
            .unwrap_or_default();
        &LOOKUP_SPECS[idx]
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

// ── LookupSet ────────────────────────────────────────────────────────

/// Options for every lookup kind. Always holds all eight keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupSet(BTreeMap<LookupKind, Vec<LookupOption>>);

impl Default for LookupSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl LookupSet {
    /// Eight empty lists.
    pub fn empty() -> Self {
        Self(LookupKind::iter().map(|k| (k, Vec::new())).collect())
    }

    pub fn get(&self, kind: LookupKind) -> &[LookupOption] {
        self.0.get(&kind).map_or(&[], Vec::as_slice)
    }

    pub fn set(&mut self, kind: LookupKind, options: Vec<LookupOption>) {
        self.0.insert(kind, options);
    }

    pub fn contains(&self, kind: LookupKind, id: &str) -> bool {
        self.get(kind).iter().any(|o| o.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LookupKind, &[LookupOption])> {
        self.0.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Total number of options across all kinds.
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

// ── Load result ──────────────────────────────────────────────────────

/// One lookup walk that failed.
#[derive(Debug)]
pub struct LookupFailure {
    pub kind: LookupKind,
    pub path: &'static str,
    pub error: CoreError,
}

/// Outcome of [`LookupAggregator::load_all`].
///
/// `lookups` is either fully populated or entirely empty; never partial.
#[derive(Debug)]
pub struct LookupLoad {
    pub lookups: LookupSet,
    pub failures: Vec<LookupFailure>,
}

impl LookupLoad {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Some walk failed because the session is missing or was rejected (401/403).
    pub fn requires_login(&self) -> bool {
        self.failures.iter().any(|f| f.error.requires_login())
    }

    /// The set, or the first failure.
    pub fn into_result(self) -> Result<LookupSet, CoreError> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.lookups),
        }
    }
}

// ── Aggregator ───────────────────────────────────────────────────────

/// Runs the lookup walks against one client.
#[derive(Debug, Clone)]
pub struct LookupAggregator {
    client: Arc<ApiClient>,
    max_pages: u32,
}

impl LookupAggregator {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            max_pages: qpw_api::paginate::DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Walk all eight resources concurrently.
    ///
    /// Waits for every walk to settle. If any failed, the returned set is
    /// eight empty lists and each failure is logged and reported.
    pub async fn load_all(&self) -> LookupLoad {
        let walks = LOOKUP_SPECS
            .iter()
            .map(|spec| async move { (spec, self.load_spec(spec).await) });
        let results = join_all(walks).await;

        let mut lookups = LookupSet::empty();
        let mut failures = Vec::new();

        for (spec, result) in results {
            match result {
                Ok(options) => lookups.set(spec.kind, options),
                Err(error) => {
                    warn!(kind = %spec.kind, path = spec.path, error = %error, "lookup failed");
                    failures.push(LookupFailure {
                        kind: spec.kind,
                        path: spec.path,
                        error,
                    });
                }
            }
        }

        if failures.is_empty() {
            info!(total = lookups.total(), "lookups loaded");
        } else {
            warn!(
                failed = failures.len(),
                "discarding all lookups after partial failure"
            );
            lookups = LookupSet::empty();
        }

        LookupLoad { lookups, failures }
    }

    /// Walk a single resource.
    pub async fn load_one(&self, kind: LookupKind) -> Result<Vec<LookupOption>, CoreError> {
        self.load_spec(kind.spec()).await
    }

    async fn load_spec(&self, spec: &LookupSpec) -> Result<Vec<LookupOption>, CoreError> {
        let params: QueryParams = spec.params.iter().copied().collect();
        let options = WalkOptions::default()
            .page_size(spec.page_size)
            .max_pages(self.max_pages);

        let entities = self.client.walk(spec.path, &params, &options).await?;
        Ok(normalize(spec, &entities))
    }
}

/// Map raw entities to options: skip id-less entities, keep the first of
/// any duplicate id.
pub fn normalize(spec: &LookupSpec, entities: &[serde_json::Value]) -> Vec<LookupOption> {
    let mut seen = HashSet::new();
    let mut options = Vec::with_capacity(entities.len());

    for entity in entities {
        let Some(option) = LookupOption::from_entity(entity, spec.label_fields) else {
            debug!(kind = %spec.kind, "skipping entity without id");
            continue;
        };
        if seen.insert(option.id.clone()) {
            options.push(option);
        }
    }

    options
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_covers_every_kind_once() {
        let kinds: Vec<LookupKind> = LOOKUP_SPECS.iter().map(|s| s.kind).collect();
        let all: Vec<LookupKind> = LookupKind::iter().collect();
        assert_eq!(kinds, all);
        for kind in LookupKind::iter() {
            assert_eq!(kind.spec().kind, kind);
            assert!((1..=200).contains(&kind.spec().page_size));
        }
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(LookupKind::WrapupCodes.name(), "wrapup_codes");
        assert_eq!(LookupKind::WrapupCodes.to_string(), "wrapup_codes");
        assert_eq!("queues".parse::<LookupKind>().unwrap(), LookupKind::Queues);
        assert!("agents".parse::<LookupKind>().is_err());
    }

    #[test]
    fn empty_set_has_all_kinds() {
        let set = LookupSet::empty();
        assert_eq!(set.iter().count(), 8);
        assert!(set.is_empty());
        assert_eq!(set.total(), 0);
    }

    #[test]
    fn normalize_dedupes_and_skips() {
        let entities = vec![
            json!({ "id": "q1", "name": "Sales" }),
            json!({ "name": "no id" }),
            json!({ "id": "q1", "name": "Sales (dup)" }),
            json!({ "id": "q2" }),
        ];
        let options = normalize(LookupKind::Queues.spec(), &entities);
        assert_eq!(
            options,
            vec![
                LookupOption {
                    id: "q1".into(),
                    label: "Sales".into(),
                },
                LookupOption {
                    id: "q2".into(),
                    label: "q2".into(),
                },
            ]
        );
    }

    #[test]
    fn set_serializes_with_snake_case_keys() {
        let mut set = LookupSet::empty();
        set.set(
            LookupKind::WrapupCodes,
            vec![LookupOption {
                id: "w1".into(),
                label: "Resolved".into(),
            }],
        );
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["wrapup_codes"][0]["label"], "Resolved");
        assert!(value["users"].as_array().unwrap().is_empty());
        assert!(set.contains(LookupKind::WrapupCodes, "w1"));
        assert!(!set.contains(LookupKind::Queues, "w1"));
    }
}
