//! Event script language for headless runs.
//!
//! A script is a list of `kind:value` items separated by commas or newlines.
//! Lines starting with `#` are comments.
//!
//! ```text
//! type:SELECT 1
//! key:f5
//! assert:contains:Query Ran Successfully
//! assert:state:row_count=1
//! ```

use super::HeadlessState;
use crate::error::{PanelError, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// A check against the rendered screen or the panel state.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    /// Screen contains the text, ignoring case.
    Contains(String),
    /// Screen contains the text exactly.
    ContainsExact(String),
    NotContains(String),
    /// Screen matches a regular expression.
    Matches(String),
    /// A state field, rendered as text, equals the value.
    StateEquals { field: String, value: String },
    /// Numeric comparison of a state field (`>=`, `<=`, `>`, `<`).
    StateCompare {
        field: String,
        op: String,
        value: String,
    },
}

impl Assertion {
    pub fn check(&self, screen: &str, state: &HeadlessState) -> bool {
        match self {
            Self::Contains(text) => screen.to_lowercase().contains(&text.to_lowercase()),
            Self::ContainsExact(text) => screen.contains(text.as_str()),
            Self::NotContains(text) => !screen.to_lowercase().contains(&text.to_lowercase()),
            Self::Matches(pattern) => Regex::new(pattern)
                .map(|re| re.is_match(screen))
                .unwrap_or(false),
            Self::StateEquals { field, value } => {
                state_field(state, field).as_deref() == Some(value.as_str())
            }
            Self::StateCompare { field, op, value } => {
                let actual = state_field(state, field).and_then(|v| v.parse::<i64>().ok());
                let expected = value.parse::<i64>().ok();
                match (actual, expected) {
                    (Some(a), Some(e)) => match op.as_str() {
                        ">=" => a >= e,
                        "<=" => a <= e,
                        ">" => a > e,
                        "<" => a < e,
                        _ => false,
                    },
                    _ => false,
                }
            }
        }
    }
}

/// Reads a state field by its serialized name. Strings come back unquoted.
fn state_field(state: &HeadlessState, field: &str) -> Option<String> {
    let value = serde_json::to_value(state).ok()?;
    match value.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => Some("null".to_string()),
        other => Some(other.to_string()),
    }
}

/// One scripted step.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    /// Types each character as a key press.
    Type(String),
    Wait(Duration),
    Resize(u16, u16),
    /// Marks a point of interest; captured as a frame in frames mode.
    Snapshot(String),
    Assert(Assertion),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => {
                let mut name = String::new();
                for (modifier, label) in [
                    (KeyModifiers::CONTROL, "ctrl+"),
                    (KeyModifiers::ALT, "alt+"),
                    (KeyModifiers::SHIFT, "shift+"),
                ] {
                    if key.modifiers.contains(modifier) {
                        name.push_str(label);
                    }
                }
                name.push_str(&key_name(key.code));
                write!(f, "key:{name}")
            }
            Self::Type(text) => write!(f, "type:{text}"),
            Self::Wait(d) => write!(f, "wait:{}ms", d.as_millis()),
            Self::Resize(w, h) => write!(f, "resize:{w}x{h}"),
            Self::Snapshot(name) => write!(f, "snapshot:{name}"),
            Self::Assert(Assertion::Contains(t)) => write!(f, "assert:contains:{t}"),
            Self::Assert(Assertion::ContainsExact(t)) => write!(f, "assert:contains-exact:{t}"),
            Self::Assert(Assertion::NotContains(t)) => write!(f, "assert:not-contains:{t}"),
            Self::Assert(Assertion::Matches(p)) => write!(f, "assert:matches:{p}"),
            Self::Assert(Assertion::StateEquals { field, value }) => {
                write!(f, "assert:state:{field}={value}")
            }
            Self::Assert(Assertion::StateCompare { field, op, value }) => {
                write!(f, "assert:state:{field}{op}{value}")
            }
        }
    }
}

/// Named keys accepted by `key:`, with their aliases.
const NAMED_KEYS: &[(&[&str], KeyCode)] = &[
    (&["enter", "return"], KeyCode::Enter),
    (&["esc", "escape"], KeyCode::Esc),
    (&["tab"], KeyCode::Tab),
    (&["backspace", "bs"], KeyCode::Backspace),
    (&["delete", "del"], KeyCode::Delete),
    (&["up"], KeyCode::Up),
    (&["down"], KeyCode::Down),
    (&["left"], KeyCode::Left),
    (&["right"], KeyCode::Right),
    (&["home"], KeyCode::Home),
    (&["end"], KeyCode::End),
    (&["pageup", "pgup"], KeyCode::PageUp),
    (&["pagedown", "pgdn"], KeyCode::PageDown),
    (&["space"], KeyCode::Char(' ')),
];

fn key_name(code: KeyCode) -> String {
    if let KeyCode::F(n) = code {
        return format!("f{n}");
    }
    if let KeyCode::Char(c) = code {
        if c != ' ' {
            return c.to_string();
        }
    }
    NAMED_KEYS
        .iter()
        .find(|(_, k)| *k == code)
        .map(|(names, _)| names[0].to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Parser for event scripts.
#[derive(Debug, Default)]
pub struct EventParser;

impl EventParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a whole script.
    pub fn parse_all(&self, input: &str) -> Result<Vec<Event>> {
        input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .flat_map(split_items)
            .filter(|item| !item.trim().is_empty())
            .map(|item| self.parse_one(&item))
            .collect()
    }

    /// Parses a single `kind:value` item.
    pub fn parse_one(&self, input: &str) -> Result<Event> {
        let input = input.trim();
        let Some((kind, value)) = input.split_once(':') else {
            return Err(PanelError::config(format!(
                "Invalid event '{input}'. Expected kind:value"
            )));
        };

        match kind.trim().to_lowercase().as_str() {
            "key" => parse_key(value.trim()).map(Event::Key),
            // Leading spaces are significant when typing
            "type" => Ok(Event::Type(value.to_string())),
            "wait" => parse_wait(value.trim()).map(Event::Wait),
            "resize" => {
                let (w, h) = parse_size(value.trim())?;
                Ok(Event::Resize(w, h))
            }
            "snapshot" => Ok(Event::Snapshot(value.trim().to_string())),
            "assert" => parse_assert(value.trim()).map(Event::Assert),
            other => Err(PanelError::config(format!(
                "Unknown event kind '{other}'. Valid kinds: key, type, wait, resize, snapshot, assert"
            ))),
        }
    }
}

/// Splits a script line on commas. `\,` is a literal comma inside an item.
fn split_items(line: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                chars.next();
                current.push(',');
            }
            ',' => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

/// Parses `enter`, `f5`, `ctrl+t`, `shift+tab` and the like.
fn parse_key(value: &str) -> Result<KeyEvent> {
    let mut parts: Vec<&str> = value.split('+').collect();
    // A literal plus sign: "key:+" or "key:ctrl++"
    if value.ends_with("++") || value == "+" {
        parts.retain(|p| !p.is_empty());
        parts.push("+");
    }
    let Some((key, modifiers)) = parts.split_last() else {
        return Err(PanelError::config("Empty key event"));
    };

    let mut mods = KeyModifiers::NONE;
    for modifier in modifiers {
        mods |= match modifier.to_lowercase().as_str() {
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "alt" => KeyModifiers::ALT,
            "shift" => KeyModifiers::SHIFT,
            other => {
                return Err(PanelError::config(format!(
                    "Unknown modifier '{other}'. Valid modifiers: ctrl, alt, shift"
                )))
            }
        };
    }

    Ok(KeyEvent::new(parse_key_code(key)?, mods))
}

fn parse_key_code(key: &str) -> Result<KeyCode> {
    let lower = key.to_lowercase();

    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Ok(KeyCode::F(n));
        }
    }

    if let Some((_, code)) = NAMED_KEYS
        .iter()
        .find(|(names, _)| names.contains(&lower.as_str()))
    {
        return Ok(*code);
    }

    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(KeyCode::Char(c)),
        _ => Err(PanelError::config(format!(
            "Unknown key '{key}'. Use a single character or a named key such as enter, esc, tab, f5"
        ))),
    }
}

/// Parses `100ms`, `2s` or a bare number of milliseconds.
fn parse_wait(value: &str) -> Result<Duration> {
    let lower = value.to_lowercase();
    let invalid = || PanelError::config(format!("Invalid duration '{value}'"));

    if let Some(ms) = lower.strip_suffix("ms") {
        ms.trim().parse().map(Duration::from_millis).map_err(|_| invalid())
    } else if let Some(secs) = lower.strip_suffix('s') {
        secs.trim().parse().map(Duration::from_secs).map_err(|_| invalid())
    } else {
        lower.parse().map(Duration::from_millis).map_err(|_| invalid())
    }
}

/// Parses `WIDTHxHEIGHT`.
pub fn parse_size(value: &str) -> Result<(u16, u16)> {
    let Some((w, h)) = value.split_once('x') else {
        return Err(PanelError::config(format!(
            "Invalid size '{value}'. Expected WIDTHxHEIGHT (e.g. 80x24)"
        )));
    };
    let width = w
        .trim()
        .parse::<u16>()
        .map_err(|_| PanelError::config(format!("Invalid width '{w}'")))?;
    let height = h
        .trim()
        .parse::<u16>()
        .map_err(|_| PanelError::config(format!("Invalid height '{h}'")))?;
    Ok((width, height))
}

fn parse_assert(value: &str) -> Result<Assertion> {
    let Some((kind, rest)) = value.split_once(':') else {
        return Err(PanelError::config(format!(
            "Invalid assertion '{value}'. Expected assert:kind:value"
        )));
    };
    let rest = rest.trim().to_string();

    match kind.trim().to_lowercase().as_str() {
        "contains" => Ok(Assertion::Contains(rest)),
        "contains-exact" => Ok(Assertion::ContainsExact(rest)),
        "not-contains" => Ok(Assertion::NotContains(rest)),
        "matches" => Ok(Assertion::Matches(rest)),
        "state" => parse_state_assertion(&rest),
        other => Err(PanelError::config(format!(
            "Unknown assertion '{other}'. Valid assertions: contains, contains-exact, not-contains, matches, state"
        ))),
    }
}

/// Parses `field=value` or `field>=number` (also `<=`, `>`, `<`).
fn parse_state_assertion(value: &str) -> Result<Assertion> {
    for op in [">=", "<=", ">", "<", "="] {
        if let Some((field, expected)) = value.split_once(op) {
            let field = field.trim().to_string();
            let expected = expected.trim().to_string();
            return Ok(if op == "=" {
                Assertion::StateEquals {
                    field,
                    value: expected,
                }
            } else {
                Assertion::StateCompare {
                    field,
                    op: op.to_string(),
                    value: expected,
                }
            });
        }
    }

    Err(PanelError::config(format!(
        "Invalid state assertion '{value}'. Expected field=value or field>=number"
    )))
}
