//! Validation error codes, severities, and message templates.
//!
//! [AMP validation errors](https://amp.dev/documentation/guides-and-tutorials/learn/validation-workflow/validation_errors/)
//!
//! Every correction a sanitization pass applies is reported under one of these
//! codes. The wire form is `SCREAMING_SNAKE_CASE` (`DISALLOWED_TAG`), produced
//! by `Display` and used by serde in the embedded catalog and the validate
//! response. A code by itself never decides whether a response is blocked;
//! that is the reporter's job.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// How severe a reported violation is.
///
/// `Error` entries participate in blocking-count resolution; `Warning`
/// entries are informational and never block a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A conformance violation that was corrected.
    Error,
    /// A best-effort adjustment that needs no correction decision.
    Warning,
}

/// The validation error taxonomy.
///
/// Grouped into structural (tags and their placement), attribute, layout,
/// CSS-syntax, URL/resource, script/extension, and CDATA/document codes.
/// Each code has a message template and tie-break specificity in the embedded
/// catalog (`SpecTable::error_template`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Structural: tags and their placement.
    /// The tag has no spec at all and was removed.
    DisallowedTag,
    /// The tag is explicitly denied regardless of context.
    GeneralDisallowedTag,
    /// A custom script tag that is neither the runtime nor an extension.
    DisallowedScriptTag,
    /// A tag the document is required to contain is absent.
    MandatoryTagMissing,
    /// A tag that may appear only once appeared again.
    DuplicateUniqueTag,
    /// A tolerated duplicate of a unique tag (reported, not corrected).
    DuplicateUniqueTagWarning,
    /// The tag's immediate parent is not the mandatory parent.
    WrongParentTag,
    /// The tag is missing a mandatory ancestor.
    MandatoryTagAncestor,
    /// The tag is missing a mandatory ancestor; the template names the
    /// AMP equivalent to use instead.
    MandatoryTagAncestorWithHint,
    /// The tag sits inside an ancestor that disallows it.
    DisallowedTagAncestor,
    /// The tag has the wrong number of some child tag.
    IncorrectNumChildTags,
    /// The tag has fewer of some child tag than required.
    IncorrectMinNumChildTags,
    /// The tag contains a child tag it does not allow.
    DisallowedChildTag,
    /// The tag's first child is a tag it does not allow first.
    DisallowedFirstChildTag,
    /// The tag's mandatory last child is missing or misplaced.
    MandatoryLastChildTag,
    /// The tag cannot appear together with another tag in the document.
    TagExcludedByTag,
    /// A tag required by another tag present in the document is missing.
    TagRequiredByMissing,
    /// The tag is deprecated.
    DeprecatedTag,
    /// The doctype is not the required `<!doctype html>`.
    InvalidDoctypeHtml,

    // Attributes.
    /// The attribute is not allowed on this tag.
    DisallowedAttr,
    /// The attribute value does not match the spec pattern.
    InvalidAttrValue,
    /// The attribute value does not match case-insensitively.
    InvalidAttrValueCasei,
    /// A mandatory attribute is missing.
    MandatoryAttrMissing,
    /// Exactly one attribute out of a set is required; none is present.
    MandatoryOneofAttrMissing,
    /// At least one attribute out of a set is required; none is present.
    MandatoryAnyofAttrMissing,
    /// The attribute is only allowed when another attribute is present.
    AttrRequiredButMissing,
    /// The attribute is deprecated.
    DeprecatedAttr,
    /// A property inside the attribute value is not allowed.
    DisallowedPropertyInAttrValue,
    /// A property inside the attribute value has an invalid value.
    InvalidPropertyValueInAttrValue,
    /// A mandatory property is missing from the attribute value.
    MandatoryPropertyMissingFromAttrValue,
    /// Mustache template syntax appears unescaped in an attribute value.
    UnescapedTemplateInAttrValue,
    /// A mustache template partial appears in an attribute value.
    TemplatePartialInAttrValue,
    /// Mustache template syntax appears in an attribute name.
    TemplateInAttrName,
    /// The attribute is disallowed under the implied layout.
    AttrDisallowedByImpliedLayout,
    /// The attribute is disallowed under the specified layout.
    AttrDisallowedBySpecifiedLayout,

    // Layout.
    /// The specified layout is not supported by this tag.
    SpecifiedLayoutInvalid,
    /// The layout implied by the sizing attributes is not supported.
    ImpliedLayoutInvalid,
    /// The layout requires an attribute that is absent.
    AttrValueRequiredByLayout,
    /// Sizing attributes are missing; fallback dimensions were applied.
    MissingLayoutDimensions,
    /// `width` and `height` use inconsistent units.
    InconsistentUnitsForWidthAndHeight,

    // Stylesheets and CSS syntax.
    /// The author stylesheet exceeds the byte budget.
    StylesheetTooLong,
    /// Stylesheet plus inline styles together exceed the byte budget.
    StylesheetAndInlineStyleTooLong,
    /// One inline style attribute exceeds its byte budget.
    InlineStyleTooLong,
    /// A disallowed at-rule was stripped.
    CssSyntaxInvalidAtRule,
    /// A declaration could not be parsed and was dropped.
    CssSyntaxInvalidDeclaration,
    /// A disallowed property was stripped.
    CssSyntaxInvalidProperty,
    /// An `!important` annotation was stripped.
    CssSyntaxInvalidImportant,
    /// A stray trailing backslash was dropped.
    CssSyntaxStrayTrailingBackslash,
    /// A comment was never closed.
    CssSyntaxUnterminatedComment,
    /// A string ran into a newline or end of input.
    CssSyntaxUnterminatedString,
    /// A `url()` could not be parsed.
    CssSyntaxBadUrl,
    /// End of stylesheet inside a rule prelude.
    CssSyntaxEofInPreludeOfQualifiedRule,
    /// A media query uses a disallowed media type.
    CssSyntaxDisallowedMediaType,
    /// A media query uses a disallowed media feature.
    CssSyntaxDisallowedMediaFeature,
    /// A media query could not be parsed.
    CssSyntaxMalformedMediaQuery,
    /// A selector uses a disallowed pseudo-class.
    CssSyntaxDisallowedPseudoClass,
    /// A selector uses a disallowed pseudo-element.
    CssSyntaxDisallowedPseudoElement,
    /// A property carries a disallowed value.
    CssSyntaxDisallowedPropertyValue,
    /// A CSS URL is relative where only absolute is allowed.
    CssSyntaxDisallowedRelativeUrl,
    /// A CSS URL points at a disallowed domain.
    CssSyntaxDisallowedDomain,
    /// A CSS URL is malformed.
    CssSyntaxInvalidUrl,
    /// A CSS URL uses a disallowed protocol.
    CssSyntaxInvalidUrlProtocol,
    /// Rule nesting exceeds the supported depth.
    CssExcessivelyNested,

    // URLs and resources.
    /// A mandatory URL attribute is empty.
    MissingUrl,
    /// A URL attribute value is malformed.
    InvalidUrl,
    /// A URL attribute uses a disallowed protocol.
    InvalidUrlProtocol,
    /// A URL points at a disallowed domain.
    DisallowedDomain,
    /// A URL is relative where only absolute is allowed.
    DisallowedRelativeUrl,

    // Scripts and extensions.
    /// A component is used without its companion extension script.
    MissingRequiredExtension,
    /// An extension script is present but no component uses it.
    ExtensionUnused,
    /// An extension script pins a version that does not exist.
    InvalidExtensionVersion,
    /// An extension script src is not a valid CDN extension path.
    InvalidExtensionPath,
    /// Runtime and extension scripts mix release channels.
    IncorrectScriptReleaseVersion,
    /// An extension script pins a deprecated version.
    DeprecatedExtensionVersion,
    /// A script src points at a non-CDN host posing as the runtime.
    DisallowedAmpDomain,

    // CDATA and document-level.
    /// Mandatory element text (e.g. the boilerplate) is missing or altered.
    MandatoryCdataMissingOrIncorrect,
    /// Element text matches a denied pattern (e.g. `CDATA` importing CSS).
    CdataViolatesDenylist,
    /// A JSON script's text is not valid JSON.
    InvalidJsonCdata,
    /// Non-whitespace text where none is allowed.
    NonWhitespaceCdataEncountered,
    /// The document exceeds the processable size limit.
    DocumentSizeLimitExceeded,
    /// The element carries dev-mode markup that only validates in dev mode.
    DevModeOnly,
}

/// One entry of the error catalog: message template plus the weights the
/// validator uses to choose which of several plausible violations to report.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorTemplate {
    /// The code this template renders.
    pub code: ErrorCode,
    /// Message with `%1`..`%9` positional placeholders.
    pub message: String,
    /// Tie-break weight; lower values are more specific and win.
    pub specificity: u32,
    /// Default severity for errors reported under this code.
    pub severity: Severity,
}

impl ErrorTemplate {
    /// Render the message, substituting `%1`..`%9` with `params` in order.
    /// Placeholders without a matching param render as nothing; a literal
    /// `%` not followed by a digit passes through.
    #[must_use]
    pub fn render(&self, params: &[&str]) -> String {
        let mut out = String::with_capacity(self.message.len());
        let mut chars = self.message.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '%' {
                if let Some(digit) = chars.peek().and_then(|p| p.to_digit(10)) {
                    if digit >= 1 {
                        let _ = chars.next();
                        if let Some(param) = params.get(digit as usize - 1) {
                            out.push_str(param);
                        }
                        continue;
                    }
                }
            }
            out.push(c);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(message: &str) -> ErrorTemplate {
        ErrorTemplate {
            code: ErrorCode::DisallowedTag,
            message: message.to_string(),
            specificity: 0,
            severity: Severity::Error,
        }
    }

    #[test]
    fn test_wire_names_are_screaming_snake_case() {
        assert_eq!(ErrorCode::DisallowedTag.to_string(), "DISALLOWED_TAG");
        assert_eq!(
            ErrorCode::CssSyntaxInvalidAtRule.to_string(),
            "CSS_SYNTAX_INVALID_AT_RULE"
        );
        assert_eq!(
            ErrorCode::InvalidUrlProtocol.to_string(),
            "INVALID_URL_PROTOCOL"
        );
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&ErrorCode::MandatoryAttrMissing).unwrap();
        assert_eq!(json, "\"MANDATORY_ATTR_MISSING\"");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::MandatoryAttrMissing);
    }

    #[test]
    fn test_render_substitutes_in_order() {
        let t = template("The attribute '%1' in tag '%2' is disallowed.");
        assert_eq!(
            t.render(&["onclick", "a"]),
            "The attribute 'onclick' in tag 'a' is disallowed."
        );
    }

    #[test]
    fn test_render_missing_param_renders_empty() {
        let t = template("Tag '%1' (%2)");
        assert_eq!(t.render(&["div"]), "Tag 'div' ()");
    }

    #[test]
    fn test_render_literal_percent_passes_through() {
        let t = template("width is 100% of '%1'");
        assert_eq!(t.render(&["body"]), "width is 100% of 'body'");
    }
}
