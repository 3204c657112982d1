//! Pose Benefits Lookup
//!
//! For each requested pose: retrieve matching chunks, ask the model for a
//! four-section summary, and list the sources. Poses are processed one at a
//! time and a failure only affects its own section.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::services::knowledge::retriever::{DocumentRetriever, RetrievedChunk};
use crate::utils::error::AppResult;
use crate::utils::text::title_case;
use yoga_gpt_llm::{LlmProvider, LlmRequestOptions, Message, ToolCallMode};

pub const NO_POSES_MESSAGE: &str = "Please specify which pose(s) you want to know about.";
pub const POSE_ERROR_MESSAGE: &str = "An error occurred while retrieving pose information.";

/// Chunks fed into one summary.
const SUMMARY_CONTEXT_CHUNKS: usize = 3;

fn retrieval_query(pose: &str) -> String {
    format!(
        "Tell me the benefits and contraindications of the yoga pose '{}'.",
        pose
    )
}

fn summary_prompt(pose: &str, combined_text: &str) -> String {
    format!(
        "You are a yoga expert assistant.\n\n\
Based on the following text about the pose '{pose}', provide a clear, concise summary with four sections:\n\n\
Description:\n- A brief explanation of the pose and its purpose.\n\n\
How to perform:\n- Step-by-step instructions on how to get into the pose safely and correctly.\n\n\
Benefits:\n- List main benefits in bullet points.\n\n\
Contraindications:\n- List main contraindications in bullet points.\n\n\
Separate the sections with a blank line. Use simple language.\n\n\
Text:\n{combined_text}"
    )
}

pub struct PoseBenefits {
    retriever: Arc<dyn DocumentRetriever>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl PoseBenefits {
    pub fn new(
        retriever: Arc<dyn DocumentRetriever>,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            llm,
            top_k,
        }
    }

    /// Markdown sections for every pose, joined by blank lines.
    pub async fn lookup(&self, pose_names: &[String]) -> String {
        if pose_names.is_empty() {
            return NO_POSES_MESSAGE.to_string();
        }

        let mut sections = Vec::with_capacity(pose_names.len());
        for pose in pose_names {
            let section = match self.pose_section(pose).await {
                Ok(section) => section,
                Err(e) => {
                    warn!(pose = %pose, error = %e, "pose lookup failed");
                    format!("### {}\n\n{}", title_case(pose), POSE_ERROR_MESSAGE)
                }
            };
            sections.push(section);
        }
        sections.join("\n\n")
    }

    async fn pose_section(&self, pose: &str) -> AppResult<String> {
        let heading = format!("### {}", title_case(pose));
        let chunks = self
            .retriever
            .retrieve(&retrieval_query(pose), self.top_k)
            .await?;
        if chunks.is_empty() {
            debug!(pose = %pose, "no chunks retrieved");
            return Ok(format!("{}\n\nNo information found.", heading));
        }

        let context: Vec<&RetrievedChunk> = chunks.iter().take(SUMMARY_CONTEXT_CHUNKS).collect();
        let combined_text = context
            .iter()
            .map(|c| c.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let response = self
            .llm
            .send_message(
                vec![Message::user(summary_prompt(pose, &combined_text))],
                None,
                Vec::new(),
                LlmRequestOptions {
                    tool_call_mode: ToolCallMode::None,
                    ..Default::default()
                },
            )
            .await?;

        let sources: BTreeSet<&str> = context.iter().map(|c| c.chunk.source.as_str()).collect();
        let mut section = format!("{}\n\n{}", heading, response.text_content().trim());
        section.push_str("\n\n**Sources:**\n");
        section.push_str(
            &sources
                .iter()
                .map(|s| format!("- {}", s))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        Ok(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{text_response, timeout_error, MockLlmProvider, StaticRetriever};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_list_makes_no_calls() {
        let retriever = Arc::new(StaticRetriever::new());
        let llm = Arc::new(MockLlmProvider::new(vec![]));
        let lookup = PoseBenefits::new(retriever.clone(), llm.clone(), 3);

        assert_eq!(lookup.lookup(&[]).await, NO_POSES_MESSAGE);
        assert_eq!(retriever.call_count(), 0);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_summary_with_sorted_sources() {
        let retriever = Arc::new(StaticRetriever::new().with(
            "tree pose",
            &[
                ("Tree pose improves balance.", "data/b.pdf"),
                ("Stand on one leg.", "data/a.pdf"),
                ("Avoid with ankle injury.", "data/b.pdf"),
                ("Fourth chunk is not summarized.", "data/c.pdf"),
            ],
        ));
        let llm = Arc::new(MockLlmProvider::new(vec![text_response(
            "Description:\n- A standing balance.",
        )]));
        let lookup = PoseBenefits::new(retriever, llm.clone(), 4);

        let out = lookup.lookup(&names(&["tree pose"])).await;
        assert!(out.starts_with("### Tree Pose\n\nDescription:"));
        assert!(out.ends_with("**Sources:**\n- data/a.pdf\n- data/b.pdf"));
        assert!(!out.contains("data/c.pdf"));

        let prompt = &llm.requests()[0].messages[0].content;
        assert!(prompt.contains("about the pose 'tree pose'"));
        assert!(prompt.contains("Tree pose improves balance.\n\nStand on one leg."));
        assert!(!prompt.contains("Fourth chunk"));
    }

    #[tokio::test]
    async fn test_no_chunks_continues_with_next_pose() {
        let retriever = Arc::new(
            StaticRetriever::new().with("cobra", &[("Cobra opens the chest.", "data/c.pdf")]),
        );
        let llm = Arc::new(MockLlmProvider::new(vec![text_response("Cobra summary")]));
        let lookup = PoseBenefits::new(retriever.clone(), llm.clone(), 3);

        let out = lookup.lookup(&names(&["flying unicorn", "cobra"])).await;
        let sections: Vec<&str> = out.split("\n\n### ").collect();
        assert_eq!(sections[0], "### Flying Unicorn\n\nNo information found.");
        assert!(!sections[0].contains("Sources"));
        assert!(sections[1].starts_with("Cobra\n\nCobra summary"));
        assert_eq!(retriever.call_count(), 2);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_per_pose() {
        let retriever = Arc::new(
            StaticRetriever::new()
                .failing_on("bridge")
                .with("pigeon", &[("Pigeon pose text", "data/a.pdf")])
                .with("lotus", &[("Lotus pose text", "data/a.pdf")]),
        );
        let llm = Arc::new(MockLlmProvider::new(vec![
            timeout_error(),
            text_response("Lotus summary"),
        ]));
        let lookup = PoseBenefits::new(retriever, llm, 3);

        let out = lookup.lookup(&names(&["bridge", "pigeon", "lotus"])).await;
        assert_eq!(out.matches(POSE_ERROR_MESSAGE).count(), 2);
        assert!(out.contains("### Bridge\n\nAn error occurred"));
        assert!(out.contains("### Pigeon\n\nAn error occurred"));
        assert!(out.contains("### Lotus\n\nLotus summary"));
    }
}
