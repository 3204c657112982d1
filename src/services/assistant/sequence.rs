//! Sequence builder. Deterministic, no model calls.

use crate::models::sequence::{PoseStep, Sequence, YogaStyle};
use crate::utils::text::title_case;

const MISSING_POSES: &str = "Invalid or missing 'poses' list.";

/// Build a timed sequence. An empty pose list yields the error payload.
pub fn create_sequence(sequence_name: Option<&str>, poses: &[String], style: YogaStyle) -> Sequence {
    if poses.is_empty() {
        return Sequence {
            sequence_name: "Error".to_string(),
            style,
            poses: Vec::new(),
            total_duration: "0 seconds".to_string(),
            error: Some(MISSING_POSES.to_string()),
        };
    }

    let hold = style.hold_secs();
    let steps = poses
        .iter()
        .map(|pose| PoseStep {
            name: title_case(pose),
            duration: format!("{} seconds", hold),
        })
        .collect::<Vec<_>>();

    Sequence {
        sequence_name: sequence_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} Yoga Sequence", style.label())),
        style,
        total_duration: format!("{} seconds", hold as usize * steps.len()),
        poses: steps,
        error: None,
    }
}
