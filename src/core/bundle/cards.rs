use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Error, Result};

use super::fields::{self, invalid, Row, Table};
use super::SCHEMA_VERSION;

pub const REQUIRED_HEADERS: &[&str] = &[
    "card_key",
    "card_name",
    "issuer",
    "issuer_url",
    "verified_date",
    "dining_multiplier",
    "grocery_multiplier",
    "gas_multiplier",
    "travel_multiplier",
    "other_multiplier",
    "reward_currency",
    "notes",
];

pub const OPTIONAL_HEADERS: &[&str] = &[
    "grocery_default",
    "grocery_online",
    "grocery_in_store",
    "travel_default",
    "travel_flight",
    "travel_hotel",
    "program_links",
    "conditions",
];

/// Verifier bookkeeping columns that live in the sheet but never ship.
const IGNORED_HEADERS: &[&str] = &[
    "ai_check_date (when verifier last checked this card)",
    "ai_status",
    "ai_confidence_overall",
];

const REWARD_CURRENCIES: &[&str] = &["cashback", "miles", "points"];
const NOTE_PREFIXES: &[&str] = &["portal_note:", "conditional_note:"];

#[derive(Debug, Clone, Serialize)]
pub struct CardsDocument {
    pub schema_version: u32,
    pub category_mapping: CategoryMapping,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryMapping {
    pub travel_includes_transit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub card_key: String,
    pub card_name: String,
    pub issuer: String,
    pub issuer_url: String,
    pub verified_date: String,
    pub reward_currency: String,
    pub multipliers: Multipliers,
    pub notes: Vec<Note>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub program_links: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Multipliers {
    pub dining: f64,
    pub grocery: Multiplier,
    pub gas: f64,
    pub travel: Multiplier,
    pub other: f64,
}

impl Multipliers {
    fn all_zero(&self) -> bool {
        [
            self.dining,
            self.grocery.scalar(),
            self.gas,
            self.travel.scalar(),
            self.other,
        ]
        .iter()
        .all(|v| *v == 0.0)
    }
}

/// A category rate: one number, or a default plus sub-category overrides.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Multiplier {
    Flat(f64),
    Split(BTreeMap<String, f64>),
}

impl Multiplier {
    pub fn scalar(&self) -> f64 {
        match self {
            Multiplier::Flat(v) => *v,
            Multiplier::Split(map) => map.get("default").copied().unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    PortalNote,
    ConditionalNote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub text: String,
}

pub fn build_document(cards: Vec<Card>) -> CardsDocument {
    CardsDocument {
        schema_version: SCHEMA_VERSION,
        category_mapping: CategoryMapping {
            travel_includes_transit: true,
        },
        cards,
    }
}

/// Parse and validate the canonical cards sheet.
///
/// `today` bounds `verified_date`.
pub fn parse_cards(csv_text: &str, today: NaiveDate) -> Result<Vec<Card>> {
    let table = Table::parse(csv_text, "cards")?;
    validate_headers(&table.headers)?;

    let mut seen = HashSet::new();
    let mut cards = Vec::new();

    for (line, row) in table.rows() {
        let card_key = row.trimmed("card_key");
        let row_id = format!(
            "cards_row{}:{}",
            line,
            if card_key.is_empty() {
                "(missing card_key)"
            } else {
                card_key
            }
        );

        if card_key.is_empty() {
            return Err(invalid(&row_id, "card_key is blank."));
        }
        if !seen.insert(card_key.to_string()) {
            return Err(invalid(
                &row_id,
                format!("duplicate card_key '{}'.", card_key),
            ));
        }

        cards.push(parse_card(&row, card_key, &row_id, today)?);
    }

    if cards.is_empty() {
        return Err(Error::bundle_invalid_data("cards CSV contains zero card rows."));
    }

    Ok(cards)
}

fn validate_headers(headers: &[String]) -> Result<()> {
    let effective: Vec<&str> = headers
        .iter()
        .map(String::as_str)
        .filter(|h| !IGNORED_HEADERS.contains(h))
        .collect();

    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .copied()
        .filter(|h| !effective.contains(h))
        .collect();
    if !missing.is_empty() {
        return Err(Error::bundle_invalid_data(format!(
            "Missing required headers: {:?}",
            missing
        )));
    }

    let extra: Vec<&str> = effective
        .iter()
        .copied()
        .filter(|h| !REQUIRED_HEADERS.contains(h) && !OPTIONAL_HEADERS.contains(h))
        .collect();
    if !extra.is_empty() {
        return Err(Error::bundle_invalid_data(format!(
            "Unexpected extra headers: {:?}",
            extra
        )));
    }

    Ok(())
}

fn parse_card(row: &Row<'_>, card_key: &str, row_id: &str, today: NaiveDate) -> Result<Card> {
    let card_name = row.trimmed("card_name");
    let issuer = row.trimmed("issuer");
    let issuer_url = fields::validate_https(row.get("issuer_url"), "issuer_url", row_id)?;
    fields::validate_date(row.get("verified_date"), "verified_date", row_id, Some(today))?;
    let reward_currency = row.trimmed("reward_currency").to_lowercase();

    if card_name.is_empty() {
        return Err(invalid(row_id, "card_name is blank."));
    }
    if issuer.is_empty() {
        return Err(invalid(row_id, "issuer is blank."));
    }
    if !REWARD_CURRENCIES.contains(&reward_currency.as_str()) {
        return Err(invalid(
            row_id,
            format!(
                "reward_currency='{}' not in {:?}.",
                reward_currency, REWARD_CURRENCIES
            ),
        ));
    }

    let multipliers = Multipliers {
        dining: fields::parse_number(row.get("dining_multiplier"), "dining_multiplier", row_id)?,
        grocery: subcategory_multiplier(
            row,
            row_id,
            "grocery",
            &["grocery_online", "grocery_in_store"],
        )?,
        gas: fields::parse_number(row.get("gas_multiplier"), "gas_multiplier", row_id)?,
        travel: subcategory_multiplier(
            row,
            row_id,
            "travel",
            &["travel_flight", "travel_hotel"],
        )?,
        other: fields::parse_number(row.get("other_multiplier"), "other_multiplier", row_id)?,
    };

    let notes = parse_notes(row.get("notes"));

    if multipliers.all_zero() {
        let says_no_rewards = notes.iter().any(|n| {
            n.kind == NoteKind::ConditionalNote && n.text.to_lowercase().contains("no rewards")
        });
        if !says_no_rewards {
            return Err(invalid(
                row_id,
                "all multipliers are 0 but notes does not clearly say 'No rewards'.",
            ));
        }
    }

    Ok(Card {
        card_key: card_key.to_string(),
        card_name: card_name.to_string(),
        issuer: issuer.to_string(),
        issuer_url,
        verified_date: row.trimmed("verified_date").to_string(),
        reward_currency,
        multipliers,
        notes,
        program_links: parse_program_links(row.get("program_links")),
        conditions: parse_conditions(row.get("conditions")),
    })
}

/// `grocery`/`travel` rate: the legacy scalar column, or a split object when
/// the `<category>_default` or any sub-category column is filled.
fn subcategory_multiplier(
    row: &Row<'_>,
    row_id: &str,
    category: &str,
    sub_columns: &[&str],
) -> Result<Multiplier> {
    let legacy_column = format!("{}_multiplier", category);
    let default_column = format!("{}_default", category);
    let prefix = format!("{}_", category);

    let legacy = fields::parse_number(row.get(&legacy_column), &legacy_column, row_id)?;
    let default = fields::parse_optional_number(row.get(&default_column), row_id)?;

    let mut subs = BTreeMap::new();
    for column in sub_columns.iter().copied() {
        if let Some(v) = fields::parse_optional_number(row.get(column), row_id)? {
            fields::check_range(v, column, row_id)?;
            let name = column.strip_prefix(&prefix).unwrap_or(column);
            subs.insert(name.to_string(), v);
        }
    }

    if !subs.is_empty() {
        subs.insert("default".to_string(), default.unwrap_or(legacy));
        return Ok(Multiplier::Split(subs));
    }

    // The 0..10 range applies to `<category>_default` only when it stands alone.
    match default {
        Some(d) => {
            fields::check_range(d, &default_column, row_id)?;
            Ok(Multiplier::Split(BTreeMap::from([("default".to_string(), d)])))
        }
        None => Ok(Multiplier::Flat(legacy)),
    }
}

/// Split a notes cell on `portal_note:` / `conditional_note:` markers.
///
/// Text without any marker becomes a single conditional note.
pub fn parse_notes(cell: &str) -> Vec<Note> {
    let raw = cell.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    // ASCII lowering keeps byte offsets aligned with `raw`
    let lower = raw.to_ascii_lowercase();
    let mut positions: Vec<(usize, &str)> = Vec::new();
    for prefix in NOTE_PREFIXES.iter().copied() {
        positions.extend(lower.match_indices(prefix).map(|(i, _)| (i, prefix)));
    }

    if positions.is_empty() {
        return vec![Note {
            kind: NoteKind::ConditionalNote,
            text: raw.to_string(),
        }];
    }

    positions.sort_by_key(|(i, _)| *i);

    positions
        .iter()
        .enumerate()
        .filter_map(|(n, (start, prefix))| {
            let end = positions.get(n + 1).map(|(i, _)| *i).unwrap_or(raw.len());
            let text = raw[start + prefix.len()..end]
                .trim_matches(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n' | '.' | ';' | '|'));
            if text.is_empty() {
                return None;
            }
            let kind = if prefix.starts_with("portal_note") {
                NoteKind::PortalNote
            } else {
                NoteKind::ConditionalNote
            };
            Some(Note {
                kind,
                text: text.to_string(),
            })
        })
        .collect()
}

/// Comma- or pipe-separated program keys, sorted and de-duplicated.
pub fn parse_program_links(cell: &str) -> Vec<String> {
    cell.split([',', '|'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Pipe-separated conditions, order preserved.
pub fn parse_conditions(cell: &str) -> Vec<String> {
    cell.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
