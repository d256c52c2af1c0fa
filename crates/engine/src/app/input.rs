use std::str::FromStr;

use thiserror::Error;

use crate::world::{FortressId, FortressIdError};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// What sits under the pointer, in priority order fortress > path > face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PickTarget {
    #[default]
    None,
    Fortress(FortressId),
    Path {
        source: FortressId,
        target: FortressId,
    },
    Face(u32),
}

impl PickTarget {
    pub fn fortress_id(self) -> Option<FortressId> {
        match self {
            Self::Fortress(id) => Some(id),
            _ => None,
        }
    }

    pub fn kind_label(self) -> &'static str {
        match self {
            Self::None => "Background",
            Self::Fortress(_) => "Fortress",
            Self::Path { .. } => "Road",
            Self::Face(_) => "Face",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickTargetError {
    #[error("unknown pick target kind '{0}' (expected none, fortress, path or face)")]
    UnknownKind(String),
    #[error("pick target '{raw}' expects {expected} id(s)")]
    WrongArity { raw: String, expected: usize },
    #[error("pick target '{raw}': {source}")]
    BadFortressId {
        raw: String,
        #[source]
        source: FortressIdError,
    },
    #[error("pick target '{raw}' has an invalid face index")]
    BadFaceIndex { raw: String },
}

impl FromStr for PickTarget {
    type Err = PickTargetError;

    /// Accepts `none`, `fortress:5`, `path:5:9`, the mesh name form `path_5_9`
    /// and `face:12`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let separator = if trimmed.starts_with("path_") { '_' } else { ':' };
        let mut parts = trimmed.split(separator);
        let kind = parts.next().unwrap_or_default();
        let ids = parts.collect::<Vec<_>>();

        let fortress_id = |value: &str| {
            value
                .parse::<FortressId>()
                .map_err(|source| PickTargetError::BadFortressId {
                    raw: trimmed.to_string(),
                    source,
                })
        };
        let arity = |expected: usize| {
            if ids.len() == expected {
                Ok(())
            } else {
                Err(PickTargetError::WrongArity {
                    raw: trimmed.to_string(),
                    expected,
                })
            }
        };

        match kind.to_ascii_lowercase().as_str() {
            "none" | "empty" => {
                arity(0)?;
                Ok(Self::None)
            }
            "fortress" => {
                arity(1)?;
                Ok(Self::Fortress(fortress_id(ids[0])?))
            }
            "path" => {
                arity(2)?;
                Ok(Self::Path {
                    source: fortress_id(ids[0])?,
                    target: fortress_id(ids[1])?,
                })
            }
            "face" => {
                arity(1)?;
                ids[0]
                    .trim()
                    .parse::<u32>()
                    .map(Self::Face)
                    .map_err(|_| PickTargetError::BadFaceIndex {
                        raw: trimmed.to_string(),
                    })
            }
            other => Err(PickTargetError::UnknownKind(other.to_string())),
        }
    }
}
