//! Turns the reasoning service's free-form reply into actions that can be
//! applied to [`RoomState`] without breaking any of its invariants.
//!
//! Only an unparsable reply or a missing top-level field is an error. Inside
//! the action list everything is repaired rather than rejected: unknown ids
//! are dropped, coordinates are clamped, rotations are wrapped, and fields
//! of the wrong type fall back to the item's current values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::catalog::FurnitureSpec;
use crate::error::ValidationError;
use crate::geometry::normalize_degrees;
use crate::state::RoomState;

static LEADING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```(?:json|js)?[ \t]*\r?\n?").expect("leading fence regex"));
static TRAILING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n?```\s*$").expect("trailing fence regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedAction {
    pub id: String,
    pub x: f32,
    pub z: f32,
    pub rotation: f32,
    pub swap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedInstruction {
    pub actions: Vec<SanitizedAction>,
    pub room_description: String,
    pub user_message: String,
    /// Ids the service mentioned that are not in the room.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<String>,
}

/// Remove a markdown code fence wrapped around the payload, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let start = LEADING_FENCE.find(trimmed).map_or(0, |found| found.end());
    let body = &trimmed[start..];
    let end = TRAILING_FENCE
        .find(body)
        .map_or(body.len(), |found| found.start());
    body[..end].trim()
}

pub fn validate(raw: &str, state: &RoomState) -> Result<ValidatedInstruction, ValidationError> {
    let payload: Value = serde_json::from_str(strip_code_fence(raw))?;
    let Value::Object(fields) = payload else {
        return Err(ValidationError::NotAnObject);
    };

    let raw_actions = match fields.get("actions") {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("actions")),
        Some(Value::Array(actions)) => actions,
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "actions",
                expected: "an array",
            })
        }
    };
    let room_description = required_text(&fields, "room_description")?;
    let user_message = required_text(&fields, "user_message")?;

    let mut actions = Vec::with_capacity(raw_actions.len());
    let mut dropped = Vec::new();
    for raw_action in raw_actions {
        match sanitize_action(raw_action, state) {
            Ok(action) => actions.push(action),
            Err(Some(id)) => dropped.push(id),
            Err(None) => log::debug!("discarding action without an item id: {raw_action}"),
        }
    }
    if !dropped.is_empty() {
        log::warn!("dropped actions for unknown items: {}", dropped.join(", "));
    }

    Ok(ValidatedInstruction {
        actions,
        room_description,
        user_message,
        dropped,
    })
}

fn required_text(fields: &Map<String, Value>, name: &'static str) -> Result<String, ValidationError> {
    match fields.get(name) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            Err(ValidationError::MissingField(name))
        }
        Some(_) => Err(ValidationError::WrongType {
            field: name,
            expected: "a string",
        }),
    }
}

/// `Err(Some(id))` for an unknown id, `Err(None)` when no id is readable.
fn sanitize_action(raw: &Value, state: &RoomState) -> Result<SanitizedAction, Option<String>> {
    let id = raw.get("id").and_then(Value::as_str).ok_or(None)?;
    let Some(item) = state.get(id) else {
        return Err(Some(id.to_string()));
    };
    let current = item.pose();

    let wants_swap = raw.get("swap").and_then(Value::as_bool).unwrap_or(false);
    let swappable = state
        .catalog()
        .get(id)
        .is_some_and(FurnitureSpec::is_swappable);
    let swap = wants_swap && swappable;
    if wants_swap && !swappable {
        log::debug!("ignoring swap request for single-variant item {id}");
    }

    let x = number(raw, "x").unwrap_or(current.x);
    let z = number(raw, "z").unwrap_or(current.z);
    let room = state.room();
    let (clamped_x, clamped_z) = if swap {
        room.clamp_point(x, z)
    } else {
        room.clamp_center(x, z, item.width(), item.depth())
    };
    if clamped_x != x || clamped_z != z {
        log::debug!("clamped {id} from {x:.3},{z:.3} to {clamped_x:.3},{clamped_z:.3}");
    }

    let rotation = number(raw, "rotation")
        .filter(|degrees| degrees.is_finite())
        .map(normalize_degrees)
        .unwrap_or(current.rotation);

    Ok(SanitizedAction {
        id: id.to_string(),
        x: clamped_x,
        z: clamped_z,
        rotation,
        swap,
    })
}

fn number(raw: &Value, field: &str) -> Option<f32> {
    let value = raw.get(field)?.as_f64()? as f32;
    (!value.is_nan()).then_some(value)
}
