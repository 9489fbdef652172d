//! Typed records from raw JSON:API-like pages
//!
//! Response shape varies across API deployments, so program name and award
//! amount are each resolved through an ordered list of strategies. Each
//! strategy is a pure function from a node (plus the page's included
//! resources) to an optional value; the first hit wins. Supporting a new
//! shape means appending a strategy.

use super::types::{ActivityRecord, UNKNOWN_PROGRAM};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// Field names a resolver looks for
#[derive(Debug, Clone, Copy)]
pub struct ResolverProfile {
    /// Relationship keys that point at the program/team, in priority order
    pub entity_relationships: &'static [&'static str],
    pub name_attributes: &'static [&'static str],
    /// Amount spellings on the node's own attributes
    pub amount_attributes: &'static [&'static str],
    pub award_relationship: &'static str,
    pub award_amount_attributes: &'static [&'static str],
    /// Attribute carrying the activity instant; nodes without it are dropped
    pub timestamp_attribute: &'static str,
}

const NAME_ATTRIBUTES: &[&str] = &["name", "handle"];
const AMOUNT_ATTRIBUTES: &[&str] = &[
    "total_awarded_amount",
    "total_awarded_amount_in_usd",
    "awarded_amount",
    "bounty_amount",
];
const AWARD_AMOUNT_ATTRIBUTES: &[&str] = &["amount_in_usd", "amount"];

/// Filtered stream: records keyed on the latest bounty-awarded activity
pub const PRIMARY_PROFILE: ResolverProfile = ResolverProfile {
    entity_relationships: &["program", "team"],
    name_attributes: NAME_ATTRIBUTES,
    amount_attributes: AMOUNT_ATTRIBUTES,
    award_relationship: "award",
    award_amount_attributes: AWARD_AMOUNT_ATTRIBUTES,
    timestamp_attribute: "latest_disclosable_activity_at",
};

/// Unfiltered newest-first stream: records keyed on disclosure time
pub const FALLBACK_PROFILE: ResolverProfile = ResolverProfile {
    entity_relationships: &["team", "program"],
    name_attributes: NAME_ATTRIBUTES,
    amount_attributes: AMOUNT_ATTRIBUTES,
    award_relationship: "award",
    award_amount_attributes: AWARD_AMOUNT_ATTRIBUTES,
    timestamp_attribute: "disclosed_at",
};

/// Id-addressable view of a page's `included` list
pub struct IncludedIndex<'p> {
    by_id: HashMap<String, Vec<&'p Value>>,
}

impl<'p> IncludedIndex<'p> {
    pub fn from_page(page: &'p Value) -> Self {
        let mut by_id: HashMap<String, Vec<&'p Value>> = HashMap::new();

        if let Some(included) = page.get("included").and_then(Value::as_array) {
            for resource in included {
                if let Some(id) = resource.get("id").and_then(id_string) {
                    by_id.entry(id).or_default().push(resource);
                }
            }
        }

        Self { by_id }
    }

    /// Resource a relationship pointer (`{id, type}`) refers to
    ///
    /// Matches on type as well when both sides carry one, since ids are only
    /// unique per type.
    pub fn lookup(&self, pointer: &Value) -> Option<&'p Value> {
        let id = pointer.get("id").and_then(id_string)?;
        let candidates = self.by_id.get(&id)?;

        match pointer.get("type").and_then(Value::as_str) {
            Some(kind) => candidates
                .iter()
                .find(|r| r.get("type").and_then(Value::as_str) == Some(kind))
                .or_else(|| candidates.iter().find(|r| r.get("type").is_none()))
                .copied(),
            None => candidates.first().copied(),
        }
    }
}

type NameStrategy = fn(&Value, &IncludedIndex, &ResolverProfile) -> Option<String>;
type AmountStrategy = fn(&Value, &IncludedIndex, &ResolverProfile) -> Option<Decimal>;

const NAME_STRATEGIES: &[NameStrategy] = &[inline_relationship_name, included_relationship_name];
const AMOUNT_STRATEGIES: &[AmountStrategy] = &[node_attribute_amount, included_award_amount];

#[derive(Debug, Clone, Copy)]
pub struct RecordResolver {
    profile: ResolverProfile,
}

impl RecordResolver {
    pub fn new(profile: ResolverProfile) -> Self {
        Self { profile }
    }

    pub fn primary() -> Self {
        Self::new(PRIMARY_PROFILE)
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_PROFILE)
    }

    /// Resolve every node of a page; nodes without a timestamp are skipped
    pub fn resolve(&self, page: &Value) -> Vec<ActivityRecord> {
        let nodes = match page.get("data").and_then(Value::as_array) {
            Some(nodes) => nodes,
            None => return Vec::new(),
        };

        let included = IncludedIndex::from_page(page);
        let mut records = Vec::with_capacity(nodes.len());
        let mut skipped = 0usize;

        for node in nodes {
            match self.resolve_node(node, &included) {
                Some(record) => records.push(record),
                None => {
                    skipped += 1;
                    log::debug!(
                        "Skipping node {:?}: no usable '{}'",
                        node.get("id").and_then(id_string),
                        self.profile.timestamp_attribute
                    );
                }
            }
        }

        if skipped > 0 {
            log::warn!(
                "Skipped {} of {} nodes without a resolvable '{}'",
                skipped,
                nodes.len(),
                self.profile.timestamp_attribute
            );
        }

        records
    }

    /// `None` when the node's activity instant cannot be determined
    pub fn resolve_node(&self, node: &Value, included: &IncludedIndex) -> Option<ActivityRecord> {
        let activity_at = attributes(node)
            .and_then(|attrs| attrs.get(self.profile.timestamp_attribute))
            .and_then(Value::as_str)
            .and_then(parse_timestamp)?;

        let program = NAME_STRATEGIES
            .iter()
            .find_map(|strategy| strategy(node, included, &self.profile))
            .unwrap_or_else(|| UNKNOWN_PROGRAM.to_string());

        let amount = AMOUNT_STRATEGIES
            .iter()
            .find_map(|strategy| strategy(node, included, &self.profile))
            .map_or(Decimal::ZERO, |amount| amount.max(Decimal::ZERO));

        let id = node.get("id").and_then(id_string).unwrap_or_default();

        Some(ActivityRecord {
            id,
            program,
            amount,
            activity_at,
        })
    }
}

fn attributes(value: &Value) -> Option<&Value> {
    value.get("attributes")
}

fn relationship_data<'v>(node: &'v Value, key: &str) -> Option<&'v Value> {
    node.get("relationships")?
        .get(key)?
        .get("data")
        .filter(|data| data.is_object())
}

fn first_name(resource: &Value, names: &[&str]) -> Option<String> {
    let attrs = attributes(resource)?;
    names.iter().find_map(|name| {
        attrs
            .get(*name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// First usable amount among `names`; `node` only labels the warning
fn first_amount(resource: &Value, names: &[&str], node: &Value) -> Option<Decimal> {
    let attrs = attributes(resource)?;
    names.iter().find_map(|name| {
        let value = attrs
            .get(*name)
            .filter(|v| !v.is_null() && v.as_str().map_or(true, |s| !s.trim().is_empty()))?;
        let amount = parse_amount(value);
        if amount.is_none() && !is_zero_amount(value) {
            log::warn!(
                "Unparseable amount {}={} on node {:?}",
                name,
                value,
                node.get("id").and_then(id_string)
            );
        }
        amount
    })
}

/// Name on an embedded relationship object
fn inline_relationship_name(node: &Value, _: &IncludedIndex, profile: &ResolverProfile) -> Option<String> {
    profile
        .entity_relationships
        .iter()
        .filter_map(|key| relationship_data(node, key))
        .find_map(|data| first_name(data, profile.name_attributes))
}

/// Name on the included resource a relationship pointer refers to
fn included_relationship_name(
    node: &Value,
    included: &IncludedIndex,
    profile: &ResolverProfile,
) -> Option<String> {
    profile
        .entity_relationships
        .iter()
        .filter_map(|key| relationship_data(node, key))
        .filter_map(|pointer| included.lookup(pointer))
        .find_map(|resource| first_name(resource, profile.name_attributes))
}

fn node_attribute_amount(node: &Value, _: &IncludedIndex, profile: &ResolverProfile) -> Option<Decimal> {
    first_amount(node, profile.amount_attributes, node)
}

/// Amount on the included award resource
fn included_award_amount(
    node: &Value,
    included: &IncludedIndex,
    profile: &ResolverProfile,
) -> Option<Decimal> {
    let pointer = relationship_data(node, profile.award_relationship)?;
    // an embedded award may carry its amount inline
    first_amount(pointer, profile.award_amount_attributes, node).or_else(|| {
        included
            .lookup(pointer)
            .and_then(|r| first_amount(r, profile.award_amount_attributes, node))
    })
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-zero amount from a JSON number or numeric string
///
/// Zero and unparseable values count as absent so the next spelling gets a
/// chance. A negative amount still ends the spelling chain; the resolver
/// records it as zero.
/// Values beyond the `Decimal` range (`"1e40"`) are unparseable.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    let parsed = amount_text(value).and_then(|text| parse_decimal(&text))?;

    if parsed.is_zero() {
        None
    } else {
        Some(parsed)
    }
}

fn amount_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.trim().trim_start_matches('$').replace(',', "")),
        _ => None,
    }
}

fn is_zero_amount(value: &Value) -> bool {
    amount_text(value)
        .and_then(|text| parse_decimal(&text))
        .map_or(false, |d| d.is_zero())
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Accepts RFC 3339, naive date-times (taken as UTC), or bare dates
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
