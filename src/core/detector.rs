//! Best-effort IN/OUT guess for a single vendor record.
//!
//! The rules run in order and the first decisive one wins. When nothing
//! matches the guess is `IN`: partial data holds more check-ins than
//! check-outs. The normalizer overrides these guesses whenever it sees the
//! whole day.

use crate::models::label::{Direction, Label};
use crate::models::raw::{RawFields, is_blank, value_to_int, value_to_text};
use tracing::{debug, info, warn};

const OUT_KEYWORDS: &[&str] = &[
    "OUT", "CHECK OUT", "CHECKOUT", "CHK OUT", "CHKOUT", "OUTGOING", "EXIT",
];
const IN_KEYWORDS: &[&str] = &["IN", "CHECK IN", "CHECKIN", "CHK IN", "CHKIN", "ENTRY"];

// Display strings are matched lowercased; the Urdu phrases are what
// localized firmware shows for "check out" / "check in".
const OUT_PHRASES: &[&str] = &["out", "check out", "checkout", "چیک آؤٹ"];
const IN_PHRASES: &[&str] = &["in", "check in", "checkin", "چیک ان"];

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Numeric { out: i64, inn: i64 },
    Text,
}

/// Well-known direction fields, checked in this order.
const KNOWN_FIELDS: &[(&str, FieldKind)] = &[
    ("log_type", FieldKind::Text),
    ("punch_state", FieldKind::Numeric { out: 1, inn: 0 }),
    ("punch", FieldKind::Numeric { out: 1, inn: 0 }),
    ("punchtype", FieldKind::Numeric { out: 1, inn: 0 }),
    ("type", FieldKind::Text),
    ("direction", FieldKind::Text),
    ("status", FieldKind::Text),
    ("verify_type", FieldKind::Numeric { out: 1, inn: 0 }),
];

/// One detection rule.
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&RawFields) -> Option<Direction>,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "keyword_scan",
        apply: keyword_scan,
    },
    Rule {
        name: "known_fields",
        apply: known_fields,
    },
    Rule {
        name: "state_display",
        apply: state_display,
    },
    Rule {
        name: "field_name_scan",
        apply: field_name_scan,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub direction: Direction,
    /// Name of the rule that decided, `None` for the default.
    pub rule: Option<&'static str>,
}

/// Guess a direction. Never fails.
pub fn detect(raw: &RawFields) -> Direction {
    detect_with_rule(raw).direction
}

pub fn detect_with_rule(raw: &RawFields) -> Detection {
    for rule in RULES {
        if let Some(direction) = (rule.apply)(raw) {
            info!(rule = rule.name, %direction, "label detected");
            return Detection {
                direction,
                rule: Some(rule.name),
            };
        }
        debug!(rule = rule.name, "rule not decisive");
    }

    warn!(
        fields = ?raw.entries().iter().map(|(k, _)| *k).collect::<Vec<_>>(),
        "could not determine direction, defaulting to IN"
    );
    Detection {
        direction: Direction::In,
        rule: None,
    }
}

/// `log_type` set to exactly IN or OUT by the source.
pub fn explicit_direction(raw: &RawFields) -> Option<Direction> {
    raw.log_type
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(Direction::parse)
}

/// Label a fresh record: explicit source direction if any, else a guess.
pub fn initial_label(raw: &RawFields) -> Label {
    match explicit_direction(raw) {
        Some(d) => Label::Authoritative(d),
        None => Label::Guessed(detect(raw)),
    }
}

/// Rule 1: any value containing an OUT keyword, then any containing IN.
pub fn keyword_scan(raw: &RawFields) -> Option<Direction> {
    let values: Vec<(&str, String)> = raw
        .entries()
        .into_iter()
        .filter(|(_, v)| !is_blank(v))
        .map(|(k, v)| (k, value_to_text(v).trim().to_uppercase()))
        .collect();

    for (keywords, direction) in [(OUT_KEYWORDS, Direction::Out), (IN_KEYWORDS, Direction::In)] {
        if let Some((field, _)) = values
            .iter()
            .find(|(_, text)| keywords.iter().any(|k| text.contains(k)))
        {
            debug!(field, %direction, "keyword found in value");
            return Some(direction);
        }
    }
    None
}

/// Rule 2: well-known direction fields, numeric (0 = IN, 1 = OUT) or text.
pub fn known_fields(raw: &RawFields) -> Option<Direction> {
    for (field, kind) in KNOWN_FIELDS {
        let Some(value) = raw.get(field).filter(|v| !v.is_null()) else {
            continue;
        };

        match kind {
            FieldKind::Numeric { out, inn } => match value_to_int(value) {
                Some(n) if n == *out => return Some(Direction::Out),
                Some(n) if n == *inn => return Some(Direction::In),
                Some(n) => debug!(field, value = n, "numeric field not a direction code"),
                None => warn!(field, value = %value, "field is not numeric"),
            },
            FieldKind::Text => {
                if let Some(d) = Direction::parse(&value_to_text(value)) {
                    return Some(d);
                }
                debug!(field, value = %value, "text field not a direction");
            }
        }
    }
    None
}

/// Rule 3: the human-readable state shown on the terminal.
pub fn state_display(raw: &RawFields) -> Option<Direction> {
    let text = raw
        .punch_state_display
        .as_ref()
        .map(value_to_text)?
        .trim()
        .to_lowercase();
    if text.is_empty() {
        return None;
    }
    match_phrases(&text)
}

/// Rule 4: any field whose name mentions punch, state or type.
pub fn field_name_scan(raw: &RawFields) -> Option<Direction> {
    raw.entries()
        .into_iter()
        .filter(|(_, v)| !is_blank(v))
        .filter(|(k, _)| {
            let key = k.to_lowercase();
            key.contains("punch") || key.contains("state") || key.contains("type")
        })
        .find_map(|(_, v)| match_phrases(&value_to_text(v).to_lowercase()))
}

fn match_phrases(text: &str) -> Option<Direction> {
    if OUT_PHRASES.iter().any(|p| text.contains(p)) {
        Some(Direction::Out)
    } else if IN_PHRASES.iter().any(|p| text.contains(p)) {
        Some(Direction::In)
    } else {
        None
    }
}
