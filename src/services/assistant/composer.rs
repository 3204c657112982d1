//! Response Composer
//!
//! Appends pose image links and the token usage block to an operation's
//! output.

use std::collections::HashSet;

use tracing::warn;

use super::pose_image::{pose_image_link, pose_slug};
use yoga_gpt_llm::UsageStats;

/// GPT-4 prices in USD per 1K tokens.
const PROMPT_PRICE_PER_1K: f64 = 0.03;
const COMPLETION_PRICE_PER_1K: f64 = 0.06;

const STALE_PRICING_NOTE: &str =
    "_Cost estimated with GPT-4 rates; the actual price for this model may differ._";

/// Estimated USD cost of one call at GPT-4 rates.
pub fn estimate_cost(usage: &UsageStats) -> f64 {
    usage.input_tokens as f64 / 1000.0 * PROMPT_PRICE_PER_1K
        + usage.output_tokens as f64 / 1000.0 * COMPLETION_PRICE_PER_1K
}

/// Whether the hardcoded rates apply to `model`.
pub fn is_gpt4_model(model: &str) -> bool {
    let model = model.to_lowercase();
    model == "gpt-4" || model.starts_with("gpt-4-")
}

pub fn usage_block(usage: &UsageStats) -> String {
    format!(
        "**Token usage:** {} tokens (Prompt: {}, Completion: {})\n\n**Estimated cost:** ${:.4}",
        usage.total_tokens(),
        usage.input_tokens,
        usage.output_tokens,
        estimate_cost(usage)
    )
}

/// Everything the composer needs from one turn.
#[derive(Debug, Clone, Default)]
pub struct ComposeInput<'a> {
    pub body: &'a str,
    pub touched_poses: &'a [String],
    pub show_images: bool,
    pub usage: Option<UsageStats>,
    pub model: &'a str,
}

pub fn compose(input: &ComposeInput<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();
    let body = input.body.trim();
    if !body.is_empty() {
        parts.push(body.to_string());
    }

    if input.show_images {
        let mut seen = HashSet::new();
        for pose in input.touched_poses {
            let slug = pose_slug(pose);
            if slug.is_empty() || !seen.insert(slug) {
                continue;
            }
            parts.push(pose_image_link(pose));
        }
    }

    if let Some(usage) = input.usage.as_ref() {
        parts.push(usage_block(usage));
        if !is_gpt4_model(input.model) {
            warn!(model = %input.model, "cost estimate uses GPT-4 pricing");
            parts.push(STALE_PRICING_NOTE.to_string());
        }
    }

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(p: u32, c: u32) -> UsageStats {
        UsageStats {
            input_tokens: p,
            output_tokens: c,
        }
    }

    #[test]
    fn test_estimate_cost() {
        let cost = estimate_cost(&usage(1000, 500));
        assert!((cost - 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_usage_block_format() {
        assert_eq!(
            usage_block(&usage(120, 30)),
            "**Token usage:** 150 tokens (Prompt: 120, Completion: 30)\n\n**Estimated cost:** $0.0054"
        );
    }

    #[test]
    fn test_links_then_usage() {
        let poses = vec![
            "tree pose".to_string(),
            "Tree Pose".to_string(),
            "cobra".to_string(),
        ];
        let out = compose(&ComposeInput {
            body: "Body text",
            touched_poses: &poses,
            show_images: true,
            usage: Some(usage(10, 5)),
            model: "gpt-4",
        });
        let expected = "Body text\n\n\
[See Tree Pose on Yoga Journal](https://www.yogajournal.com/poses/tree-pose/)\n\n\
[See Cobra on Yoga Journal](https://www.yogajournal.com/poses/cobra/)\n\n\
**Token usage:** 15 tokens (Prompt: 10, Completion: 5)\n\n**Estimated cost:** $0.0006";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_images_disabled_and_no_usage() {
        let poses = vec!["tree pose".to_string()];
        let out = compose(&ComposeInput {
            body: "Body",
            touched_poses: &poses,
            show_images: false,
            usage: None,
            model: "gpt-4",
        });
        assert_eq!(out, "Body");
    }

    #[test]
    fn test_stale_pricing_note() {
        assert!(is_gpt4_model("gpt-4-0613"));
        assert!(!is_gpt4_model("gpt-4o-mini"));

        let out = compose(&ComposeInput {
            body: "Body",
            usage: Some(usage(1, 1)),
            model: "gpt-4o-mini",
            ..Default::default()
        });
        assert!(out.ends_with(STALE_PRICING_NOTE));
    }
}
