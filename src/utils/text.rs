//! Text helpers shared by reply formatting and export.

/// Capitalize the first letter of every alphabetic run and lowercase the
/// rest. A run restarts after any non-letter, so `"child's pose"` becomes
/// `"Child'S Pose"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
