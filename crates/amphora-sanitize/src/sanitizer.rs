//! The sanitizer contract: one tree-mutating pass with a single concern.

use amphora_dom::Document;
use strum_macros::{Display, EnumIter};

use crate::context::PipelineContext;

/// Pipeline stages, in required execution order.
///
/// A pass declares its stage; the builder refuses any pipeline whose passes
/// are not in non-decreasing stage order, or that does not end at
/// [`Stage::Conformance`]. The derived `Ord` follows declaration order, so
/// comparing stages compares execution precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    /// Markup conversion: raw embeds and media become their AMP equivalents.
    Embed,
    /// Content normalization: noscript unwrapping, forms, comments.
    Content,
    /// Stylesheet collection, filtering, and tree-shaking.
    Style,
    /// Head metadata and accessibility affordances.
    Meta,
    /// The conformance validator; always the final pass.
    Conformance,
}

/// One sanitization pass.
///
/// Implementations mutate the document in place and write every correction
/// they apply into the context as a [`crate::ValidationError`]. Content-level
/// problems are always recovered locally; `sanitize` has no error path by
/// design.
pub trait Sanitizer: Send + Sync {
    /// Stable identifier, also the registry id (`"img"`, `"validator"`).
    fn name(&self) -> &'static str;

    /// The stage this pass belongs to.
    fn stage(&self) -> Stage;

    /// Apply the pass.
    fn sanitize(&self, doc: &mut Document, ctx: &mut PipelineContext);
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_stage_order_matches_declaration() {
        let stages: Vec<Stage> = Stage::iter().collect();
        assert!(stages.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(stages.last(), Some(&Stage::Conformance));
    }

    #[test]
    fn test_stage_display_is_lowercase() {
        assert_eq!(Stage::Embed.to_string(), "embed");
        assert_eq!(Stage::Conformance.to_string(), "conformance");
    }
}
