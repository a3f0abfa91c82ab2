//! Typed flag payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Position;

const TEXT_PREVIEW_LIMIT: usize = 60;

/// Runtime variant of a [`FlagValue`], used to match values against handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagValueKind {
    Boolean,
    Integer,
    Double,
    Text,
    Color,
    List,
    Actions,
    Location,
    Vector,
    Sound,
    Potion,
}

impl fmt::Display for FlagValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlagValueKind::Boolean => "boolean",
            FlagValueKind::Integer => "integer",
            FlagValueKind::Double => "double",
            FlagValueKind::Text => "text",
            FlagValueKind::Color => "color",
            FlagValueKind::List => "list",
            FlagValueKind::Actions => "actions",
            FlagValueKind::Location => "location",
            FlagValueKind::Vector => "vector",
            FlagValueKind::Sound => "sound",
            FlagValueKind::Potion => "potion",
        };
        f.write_str(name)
    }
}

/// Value carried by a flag binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlagValue {
    Boolean {
        #[serde(default = "default_enabled")]
        enabled: bool,
    },
    Integer {
        #[serde(default)]
        value: i64,
    },
    Double {
        #[serde(default)]
        value: f64,
    },
    Text {
        #[serde(default)]
        content: String,
    },
    Color {
        #[serde(default = "default_color")]
        hex: String,
    },
    List {
        #[serde(default)]
        entries: Vec<String>,
    },
    /// Ordered action ids run by the host when the flag fires.
    Actions {
        #[serde(default)]
        actions: Vec<String>,
    },
    Location {
        #[serde(default)]
        position: Position,
    },
    Vector {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        z: f64,
    },
    Sound {
        #[serde(default = "default_sound")]
        sound: String,
        #[serde(default = "default_multiplier")]
        volume: f32,
        #[serde(default = "default_multiplier")]
        pitch: f32,
    },
    Potion {
        #[serde(default = "default_potion")]
        effect: String,
        #[serde(default)]
        amplifier: i32,
        #[serde(default = "default_potion_duration")]
        duration_ticks: i32,
    },
}

fn default_enabled() -> bool {
    true
}

fn default_color() -> String {
    "#FFFFFF".to_string()
}

fn default_sound() -> String {
    "minecraft:block.note_block.pling".to_string()
}

fn default_multiplier() -> f32 {
    1.0
}

fn default_potion() -> String {
    "minecraft:speed".to_string()
}

fn default_potion_duration() -> i32 {
    200
}

impl FlagValue {
    pub fn boolean(enabled: bool) -> Self {
        FlagValue::Boolean { enabled }
    }

    pub fn text(content: impl Into<String>) -> Self {
        FlagValue::Text {
            content: content.into(),
        }
    }

    pub fn actions<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FlagValue::Actions {
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn location(position: Position) -> Self {
        FlagValue::Location { position }
    }

    /// Type-correct default payload for `kind`.
    pub fn default_for(kind: FlagValueKind) -> Self {
        match kind {
            FlagValueKind::Boolean => FlagValue::boolean(default_enabled()),
            FlagValueKind::Integer => FlagValue::Integer { value: 0 },
            FlagValueKind::Double => FlagValue::Double { value: 0.0 },
            FlagValueKind::Text => FlagValue::text(""),
            FlagValueKind::Color => FlagValue::Color {
                hex: default_color(),
            },
            FlagValueKind::List => FlagValue::List {
                entries: Vec::new(),
            },
            FlagValueKind::Actions => FlagValue::Actions {
                actions: Vec::new(),
            },
            FlagValueKind::Location => FlagValue::location(Position::origin()),
            FlagValueKind::Vector => FlagValue::Vector {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
            FlagValueKind::Sound => FlagValue::Sound {
                sound: default_sound(),
                volume: default_multiplier(),
                pitch: default_multiplier(),
            },
            FlagValueKind::Potion => FlagValue::Potion {
                effect: default_potion(),
                amplifier: 0,
                duration_ticks: default_potion_duration(),
            },
        }
    }

    pub fn kind(&self) -> FlagValueKind {
        match self {
            FlagValue::Boolean { .. } => FlagValueKind::Boolean,
            FlagValue::Integer { .. } => FlagValueKind::Integer,
            FlagValue::Double { .. } => FlagValueKind::Double,
            FlagValue::Text { .. } => FlagValueKind::Text,
            FlagValue::Color { .. } => FlagValueKind::Color,
            FlagValue::List { .. } => FlagValueKind::List,
            FlagValue::Actions { .. } => FlagValueKind::Actions,
            FlagValue::Location { .. } => FlagValueKind::Location,
            FlagValue::Vector { .. } => FlagValueKind::Vector,
            FlagValue::Sound { .. } => FlagValueKind::Sound,
            FlagValue::Potion { .. } => FlagValueKind::Potion,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Boolean { enabled } => Some(*enabled),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FlagValue::Text { content } => Some(content),
            _ => None,
        }
    }

    pub fn as_actions(&self) -> Option<&[String]> {
        match self {
            FlagValue::Actions { actions } => Some(actions),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&Position> {
        match self {
            FlagValue::Location { position } => Some(position),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    /// Short human readable rendering for inspection output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Boolean { enabled } => {
                f.write_str(if *enabled { "true" } else { "false" })
            }
            FlagValue::Integer { value } => write!(f, "{value}"),
            FlagValue::Double { value } => f.write_str(&format_number(*value)),
            FlagValue::Text { content } => f.write_str(&truncate(content)),
            FlagValue::Color { hex } => f.write_str(hex),
            FlagValue::List { entries } => write!(f, "[{}]", entries.join(", ")),
            FlagValue::Actions { actions } => write!(f, "{} action(s)", actions.len()),
            FlagValue::Location { position } => write!(
                f,
                "{}, {}, {} ({})",
                format_number(position.x),
                format_number(position.y),
                format_number(position.z),
                position.world
            ),
            FlagValue::Vector { x, y, z } => write!(
                f,
                "{}, {}, {}",
                format_number(*x),
                format_number(*y),
                format_number(*z)
            ),
            FlagValue::Sound {
                sound,
                volume,
                pitch,
            } => write!(
                f,
                "{sound} (volume {}, pitch {})",
                format_number(f64::from(*volume)),
                format_number(f64::from(*pitch))
            ),
            FlagValue::Potion {
                effect,
                amplifier,
                duration_ticks,
            } => write!(f, "{effect} {amplifier} ({duration_ticks} ticks)"),
        }
    }
}

/// At most two decimals, trailing zeros dropped.
pub fn format_number(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn truncate(content: &str) -> String {
    if content.chars().count() <= TEXT_PREVIEW_LIMIT {
        return content.to_string();
    }
    let mut preview: String = content.chars().take(TEXT_PREVIEW_LIMIT).collect();
    preview.push('…');
    preview
}
