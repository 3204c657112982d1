//! Sequence Models
//!
//! Yoga styles and the structured sequence payload returned by the
//! sequence builder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Practice style; determines how long each pose is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum YogaStyle {
    #[default]
    Hatha,
    Yin,
    Vinyasa,
}

impl YogaStyle {
    pub const ALL: [YogaStyle; 3] = [YogaStyle::Hatha, YogaStyle::Yin, YogaStyle::Vinyasa];

    /// Seconds each pose is held in this style.
    pub fn hold_secs(&self) -> u32 {
        match self {
            YogaStyle::Hatha => 30,
            YogaStyle::Yin => 180,
            YogaStyle::Vinyasa => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            YogaStyle::Hatha => "hatha",
            YogaStyle::Yin => "yin",
            YogaStyle::Vinyasa => "vinyasa",
        }
    }

    /// Capitalized name used in generated sequence titles.
    pub fn label(&self) -> &'static str {
        match self {
            YogaStyle::Hatha => "Hatha",
            YogaStyle::Yin => "Yin",
            YogaStyle::Vinyasa => "Vinyasa",
        }
    }
}

impl fmt::Display for YogaStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for YogaStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hatha" => Ok(YogaStyle::Hatha),
            "yin" => Ok(YogaStyle::Yin),
            "vinyasa" => Ok(YogaStyle::Vinyasa),
            other => Err(format!(
                "Invalid style: {}. Must be 'hatha', 'yin', or 'vinyasa'",
                other
            )),
        }
    }
}

/// One pose in a sequence with its hold time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseStep {
    pub name: String,
    pub duration: String,
}

/// A generated sequence, or the error payload when no poses were given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub sequence_name: String,
    pub style: YogaStyle,
    pub poses: Vec<PoseStep>,
    pub total_duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Sequence {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Render the sequence as a markdown reply.
    pub fn to_markdown(&self) -> String {
        if let Some(err) = &self.error {
            return format!("Could not create a sequence: {}", err);
        }

        let mut out = format!(
            "### {}\n\n**Style:** {}\n\n",
            self.sequence_name,
            self.style.label()
        );
        for (i, step) in self.poses.iter().enumerate() {
            out.push_str(&format!("{}. {} ({})\n", i + 1, step.name, step.duration));
        }
        out.push_str(&format!("\n**Total duration:** {}", self.total_duration));
        out
    }
}
