//! Operations
//!
//! The four tools the model may call, the system instruction that governs
//! them, and the typed `DispatchDecision` parsed from a tool call.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::models::sequence::YogaStyle;
use yoga_gpt_llm::{ParameterSchema, ToolCall, ToolDefinition};

pub const EXTRACT_POSE_NAMES: &str = "extract_pose_names";
pub const GET_POSE_BENEFITS: &str = "get_pose_benefits";
pub const GET_POSE_IMAGE: &str = "get_yogajournal_pose_image";
pub const CREATE_SEQUENCE: &str = "create_yoga_sequence";

/// System instruction sent with every dispatch call.
pub const SYSTEM_PROMPT: &str = "You are a helpful yoga assistant. \
Answer questions about yoga poses, their benefits, contraindications and how to perform them, \
and help users build yoga sequences.\n\n\
Rules for using tools:\n\
- When the user asks about one or more poses, always call get_pose_benefits first.\n\
- Only call get_yogajournal_pose_image after the pose benefits have been retrieved. Never call it on its own.\n\
- When the user asks for a sequence or a routine, call create_yoga_sequence with the poses and the selected style. \
Do not use it for questions about a single pose.\n\
- Never answer with only a link. Always include an explanation.\n\
- For general questions that need no tool, answer directly and concisely.";

/// All tool schemas offered to the model.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        extract_pose_names_tool(),
        create_sequence_tool(),
        pose_benefits_tool(),
        pose_image_tool(),
    ]
}

fn pose_list_schema(description: &str) -> ParameterSchema {
    ParameterSchema::array(Some(description), ParameterSchema::string(None))
}

fn extract_pose_names_tool() -> ToolDefinition {
    let mut properties = BTreeMap::new();
    properties.insert(
        "pose_names".to_string(),
        pose_list_schema("Yoga pose names found in the answer"),
    );

    ToolDefinition {
        name: EXTRACT_POSE_NAMES.to_string(),
        description: "Extract yoga pose names (English or Sanskrit) mentioned in the answer"
            .to_string(),
        input_schema: ParameterSchema::object(None, properties, vec!["pose_names".to_string()]),
    }
}

fn create_sequence_tool() -> ToolDefinition {
    let mut properties = BTreeMap::new();
    properties.insert(
        "sequence_name".to_string(),
        ParameterSchema::string(Some("Name or theme of the yoga sequence")),
    );
    properties.insert(
        "poses".to_string(),
        pose_list_schema("List of yoga poses to include in the sequence"),
    );
    properties.insert(
        "style".to_string(),
        ParameterSchema::string_enum(
            Some("Yoga style to determine default pose durations"),
            &["hatha", "yin", "vinyasa"],
        ),
    );

    ToolDefinition {
        name: CREATE_SEQUENCE.to_string(),
        description: "Create a yoga pose sequence with timings based on user input or style"
            .to_string(),
        input_schema: ParameterSchema::object(
            None,
            properties,
            vec!["poses".to_string(), "style".to_string()],
        ),
    }
}

fn pose_benefits_tool() -> ToolDefinition {
    let mut properties = BTreeMap::new();
    properties.insert(
        "pose_names".to_string(),
        pose_list_schema("List of yoga pose names"),
    );

    ToolDefinition {
        name: GET_POSE_BENEFITS.to_string(),
        description:
            "Get benefits and contraindications of yoga poses by searching the knowledge base."
                .to_string(),
        input_schema: ParameterSchema::object(None, properties, vec!["pose_names".to_string()]),
    }
}

fn pose_image_tool() -> ToolDefinition {
    let mut properties = BTreeMap::new();
    properties.insert(
        "pose_name".to_string(),
        ParameterSchema::string(Some("The name of the yoga pose.")),
    );

    ToolDefinition {
        name: GET_POSE_IMAGE.to_string(),
        description: "Get the Yoga Journal image URL for a yoga pose.".to_string(),
        input_schema: ParameterSchema::object(None, properties, vec!["pose_name".to_string()]),
    }
}

/// Which operation a turn resolved to, without its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    None,
    ExtractPoseNames,
    GetPoseBenefits,
    GetPoseImage,
    CreateSequence,
}

impl Operation {
    /// Map a tool name to its operation. Unknown names yield `None`.
    pub fn from_tool_name(name: &str) -> Option<Self> {
        match name {
            EXTRACT_POSE_NAMES => Some(Operation::ExtractPoseNames),
            GET_POSE_BENEFITS => Some(Operation::GetPoseBenefits),
            GET_POSE_IMAGE => Some(Operation::GetPoseImage),
            CREATE_SEQUENCE => Some(Operation::CreateSequence),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::None => "none",
            Operation::ExtractPoseNames => EXTRACT_POSE_NAMES,
            Operation::GetPoseBenefits => GET_POSE_BENEFITS,
            Operation::GetPoseImage => GET_POSE_IMAGE,
            Operation::CreateSequence => CREATE_SEQUENCE,
        }
    }
}

/// What the dispatcher decided to do with one model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchDecision {
    DirectAnswer {
        content: String,
    },
    ExtractPoseNames {
        pose_names: Vec<String>,
    },
    GetPoseBenefits {
        pose_names: Vec<String>,
    },
    GetPoseImage {
        pose_name: String,
    },
    CreateSequence {
        sequence_name: Option<String>,
        poses: Vec<String>,
        style: YogaStyle,
    },
}

impl DispatchDecision {
    pub fn operation(&self) -> Operation {
        match self {
            DispatchDecision::DirectAnswer { .. } => Operation::None,
            DispatchDecision::ExtractPoseNames { .. } => Operation::ExtractPoseNames,
            DispatchDecision::GetPoseBenefits { .. } => Operation::GetPoseBenefits,
            DispatchDecision::GetPoseImage { .. } => Operation::GetPoseImage,
            DispatchDecision::CreateSequence { .. } => Operation::CreateSequence,
        }
    }

    /// The decision an operation falls back to when its arguments are unusable.
    pub fn with_defaults(operation: Operation, default_style: YogaStyle) -> Self {
        match operation {
            Operation::None => DispatchDecision::DirectAnswer {
                content: String::new(),
            },
            Operation::ExtractPoseNames => DispatchDecision::ExtractPoseNames {
                pose_names: Vec::new(),
            },
            Operation::GetPoseBenefits => DispatchDecision::GetPoseBenefits {
                pose_names: Vec::new(),
            },
            Operation::GetPoseImage => DispatchDecision::GetPoseImage {
                pose_name: String::new(),
            },
            Operation::CreateSequence => DispatchDecision::CreateSequence {
                sequence_name: None,
                poses: Vec::new(),
                style: default_style,
            },
        }
    }
}

/// Tool arguments that could not be turned into a decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("arguments are not valid JSON: {0}")]
    InvalidJson(String),

    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Parse the arguments of a known tool call.
///
/// Missing fields take their defaults; present fields of the wrong shape are
/// errors. An unrecognized `style` value is not an error and falls back to
/// `default_style`.
pub fn parse_tool_call(
    operation: Operation,
    call: &ToolCall,
    default_style: YogaStyle,
) -> Result<DispatchDecision, ParseError> {
    let raw = call.arguments.trim();
    let args: Value = if raw.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(raw).map_err(|e| ParseError::InvalidJson(e.to_string()))?
    };
    let Value::Object(args) = args else {
        return Err(ParseError::NotAnObject);
    };

    let decision = match operation {
        Operation::None => DispatchDecision::DirectAnswer {
            content: String::new(),
        },
        Operation::ExtractPoseNames => DispatchDecision::ExtractPoseNames {
            pose_names: string_list(args.get("pose_names"), "pose_names")?,
        },
        Operation::GetPoseBenefits => DispatchDecision::GetPoseBenefits {
            pose_names: string_list(args.get("pose_names"), "pose_names")?,
        },
        Operation::GetPoseImage => DispatchDecision::GetPoseImage {
            pose_name: optional_string(args.get("pose_name"), "pose_name")?.unwrap_or_default(),
        },
        Operation::CreateSequence => DispatchDecision::CreateSequence {
            sequence_name: optional_string(args.get("sequence_name"), "sequence_name")?
                .filter(|name| !name.trim().is_empty()),
            poses: string_list(args.get("poses"), "poses")?,
            style: args
                .get("style")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
                .unwrap_or(default_style),
        },
    };
    Ok(decision)
}

fn string_list(value: Option<&Value>, field: &'static str) -> Result<Vec<String>, ParseError> {
    let wrong_type = || ParseError::WrongType {
        field,
        expected: "an array of strings",
    };
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(wrong_type))
            .collect(),
        Some(_) => Err(wrong_type()),
    }
}

fn optional_string(value: Option<&Value>, field: &'static str) -> Result<Option<String>, ParseError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ParseError::WrongType {
            field,
            expected: "a string",
        }),
    }
}
