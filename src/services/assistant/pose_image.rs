//! Yoga Journal pose links.

use crate::utils::text::title_case;

const YOGAJOURNAL_POSES_URL: &str = "https://www.yogajournal.com/poses";

/// Lowercase the name and collapse every run of characters outside
/// `[a-z0-9]` into a single `-`, with no leading or trailing `-`.
pub fn pose_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

pub fn pose_image_url(name: &str) -> String {
    format!("{}/{}/", YOGAJOURNAL_POSES_URL, pose_slug(name))
}

/// Markdown link shown under a reply.
pub fn pose_image_link(name: &str) -> String {
    format!(
        "[See {} on Yoga Journal]({})",
        title_case(name.trim()),
        pose_image_url(name)
    )
}
