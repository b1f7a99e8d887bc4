//! The AMP layout model.
//!
//! [AMP layout system](https://amp.dev/documentation/guides-and-tutorials/develop/style_and_layout/control_layout/)
//!
//! "The layout attribute gives you easy, per-element control over how your
//! element should render on screen." Every AMP element resolves to exactly one
//! layout, either declared via the `layout` attribute or implied from the
//! sizing attributes present.

use serde::Deserialize;
use strum_macros::{Display, EnumString};

/// [AMP layout attribute values](https://amp.dev/documentation/guides-and-tutorials/learn/common_attributes/#layout)
///
/// The wire form is the kebab-case attribute value (`fixed-height`,
/// `flex-item`), produced by `Display` and accepted by `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Element is not displayed; takes no space.
    Nodisplay,
    /// Fixed width and height, no responsive scaling.
    Fixed,
    /// Fixed height, width fills the container.
    FixedHeight,
    /// Scales with the container, preserving the width:height aspect ratio.
    Responsive,
    /// Children define the size, as in normal CSS flow.
    Container,
    /// Fills the containing element on both axes.
    Fill,
    /// Fills remaining space in a flex container.
    FlexItem,
    /// Height depends on remote content (special-cased by a few components).
    Fluid,
    /// Like responsive, but can be sized by the natural dimensions of its
    /// content up to the given width/height.
    Intrinsic,
}

impl Layout {
    /// The layout implied by the sizing attributes when no `layout` attribute
    /// is present.
    ///
    /// "If width and height are absent, the layout is container. If height is
    /// present and width is absent or equals auto, the layout is fixed-height.
    /// If width, height and sizes or heights are present, the layout is
    /// responsive. Otherwise the layout is fixed."
    #[must_use]
    pub fn implied(
        width: Option<&str>,
        height: Option<&str>,
        has_sizes_or_heights: bool,
    ) -> Self {
        match (width, height) {
            (None, None) | (Some(_), None) => Self::Container,
            (None | Some("auto"), Some(_)) => Self::FixedHeight,
            (Some(_), Some(_)) if has_sizes_or_heights => Self::Responsive,
            (Some(_), Some(_)) => Self::Fixed,
        }
    }

    /// Whether this layout needs a definite `width` attribute to be valid.
    #[must_use]
    pub const fn requires_definite_width(self) -> bool {
        matches!(self, Self::Fixed | Self::Responsive | Self::Intrinsic)
    }

    /// Whether this layout needs a definite `height` attribute to be valid.
    #[must_use]
    pub const fn requires_definite_height(self) -> bool {
        matches!(
            self,
            Self::Fixed | Self::FixedHeight | Self::Responsive | Self::Intrinsic
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_display_uses_attribute_value_form() {
        assert_eq!(Layout::FixedHeight.to_string(), "fixed-height");
        assert_eq!(Layout::FlexItem.to_string(), "flex-item");
        assert_eq!(Layout::Responsive.to_string(), "responsive");
    }

    #[test]
    fn test_from_str_parses_attribute_values() {
        assert_eq!(Layout::from_str("fixed-height"), Ok(Layout::FixedHeight));
        assert_eq!(Layout::from_str("nodisplay"), Ok(Layout::Nodisplay));
        assert!(Layout::from_str("sideways").is_err());
    }

    #[test]
    fn test_implied_container_without_dimensions() {
        assert_eq!(Layout::implied(None, None, false), Layout::Container);
    }

    #[test]
    fn test_implied_fixed_height_without_width() {
        assert_eq!(
            Layout::implied(None, Some("300"), false),
            Layout::FixedHeight
        );
        assert_eq!(
            Layout::implied(Some("auto"), Some("300"), false),
            Layout::FixedHeight
        );
    }

    #[test]
    fn test_implied_responsive_with_sizes() {
        assert_eq!(
            Layout::implied(Some("600"), Some("400"), true),
            Layout::Responsive
        );
    }

    #[test]
    fn test_implied_fixed_with_both_dimensions() {
        assert_eq!(
            Layout::implied(Some("600"), Some("400"), false),
            Layout::Fixed
        );
    }

    #[test]
    fn test_width_alone_does_not_size_the_element() {
        assert_eq!(Layout::implied(Some("600"), None, false), Layout::Container);
    }
}
