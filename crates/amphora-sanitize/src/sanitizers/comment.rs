//! Comment removal.

use amphora_dom::{Document, NodeType};

use crate::context::PipelineContext;
use crate::sanitizer::{Sanitizer, Stage};

/// Removes every comment node. Conditional comments carry markup the target
/// format cannot police; dropping them keeps output deterministic.
#[derive(Debug, Default)]
pub struct CommentSanitizer;

impl Sanitizer for CommentSanitizer {
    fn name(&self) -> &'static str {
        "comment"
    }

    fn stage(&self) -> Stage {
        Stage::Content
    }

    fn sanitize(&self, doc: &mut Document, _ctx: &mut PipelineContext) {
        let comments: Vec<_> = doc
            .descendants(doc.root())
            .filter(|&id| matches!(doc.get(id).map(|n| &n.node_type), Some(NodeType::Comment(_))))
            .collect();
        for id in comments {
            doc.detach(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use amphora_html::{SerializeMode, parse_fragment, serialize};

    use super::*;

    #[test]
    fn test_comments_are_removed_everywhere() {
        let mut doc =
            parse_fragment("<!-- lead --><p>a<!-- inner --></p><!--[if IE]>x<![endif]-->")
                .unwrap();
        CommentSanitizer.sanitize(&mut doc, &mut PipelineContext::new());
        assert_eq!(serialize(&doc, SerializeMode::Fragment), "<p>a</p>");
    }
}
