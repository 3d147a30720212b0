//! Prompt construction with literal `%1` substitution.
//!
//! Every `%1` in a saying's prompt template is replaced by the saying text,
//! and the shared context document (when non-empty) is placed in front,
//! separated by a single newline.

/// Token replaced by the saying text.
pub const PLACEHOLDER: &str = "%1";

#[derive(Debug, Default, Clone, Copy)]
pub struct PromptConstructor;

impl PromptConstructor {
    pub fn new() -> Self {
        PromptConstructor
    }

    /// Build the final prompt sent to the image provider.
    ///
    /// The saying is inserted verbatim; nothing in it is interpreted, so a
    /// saying that itself contains `%1` is not expanded again. No trimming is
    /// applied to either part.
    pub fn construct_prompt(&self, context: &str, template: &str, saying: &str) -> String {
        let substituted = self.substitute(template, saying);
        if context.is_empty() {
            substituted
        } else {
            let mut out = String::with_capacity(context.len() + 1 + substituted.len());
            out.push_str(context);
            out.push('\n');
            out.push_str(&substituted);
            out
        }
    }

    /// Replace every placeholder occurrence in `template` with `saying`.
    pub fn substitute(&self, template: &str, saying: &str) -> String {
        template.replace(PLACEHOLDER, saying)
    }
}
