//! The sanitizer registry: ids and opaque args to pass instances.
//!
//! Registrations name a sanitizer by id and carry per-sanitizer JSON args.
//! The registry is a compile-time match, resolved when the pipeline is
//! built, never per request. An unknown id or malformed args is programmer
//! misconfiguration: the registration is skipped with one warning and the
//! rest of the pipeline builds normally.

use amphora_common::warning::warn_once;
use serde_json::Value;

use crate::pipeline::{PipelineBuildError, PipelineBuilder, SanitizerPipeline};
use crate::sanitizer::Sanitizer;
use crate::sanitizers::{
    AccessibilitySanitizer, AudioSanitizer, CommentSanitizer, DevModeSanitizer, EmbedSanitizer,
    FormSanitizer, IframeSanitizer, ImgSanitizer, MetaSanitizer, ScriptSanitizer, StyleSanitizer,
    TagAttributeValidator, VideoSanitizer,
};

/// Build one sanitizer from its registry id and args. Returns `None` (after
/// warning once) for unknown ids and undeserializable args.
#[must_use]
pub fn build_sanitizer(id: &str, args: &Value) -> Option<Box<dyn Sanitizer>> {
    fn parse_args<T: serde::de::DeserializeOwned>(id: &str, args: &Value) -> Option<T> {
        match serde_json::from_value(args.clone()) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                warn_once("Registry", &format!("invalid args for sanitizer '{id}': {error}"));
                None
            }
        }
    }

    let sanitizer: Box<dyn Sanitizer> = match id {
        "embed" => Box::new(EmbedSanitizer),
        "img" => Box::new(ImgSanitizer),
        "video" => Box::new(VideoSanitizer),
        "audio" => Box::new(AudioSanitizer),
        "iframe" => Box::new(IframeSanitizer::new(parse_args(id, args)?)),
        "script" => Box::new(ScriptSanitizer),
        "form" => Box::new(FormSanitizer),
        "comment" => Box::new(CommentSanitizer),
        "style" => Box::new(StyleSanitizer::new(parse_args(id, args)?)),
        "meta" => Box::new(MetaSanitizer),
        "accessibility" => Box::new(AccessibilitySanitizer),
        "dev-mode" => Box::new(DevModeSanitizer::new(parse_args(id, args)?)),
        "validator" => Box::new(TagAttributeValidator),
        _ => {
            warn_once("Registry", &format!("unknown sanitizer id '{id}', skipping"));
            return None;
        }
    };
    Some(sanitizer)
}

/// The default registration list, in contract order.
#[must_use]
pub fn default_registrations() -> Vec<(&'static str, Value)> {
    vec![
        ("embed", Value::Null),
        ("img", Value::Null),
        ("video", Value::Null),
        ("audio", Value::Null),
        ("iframe", Value::Null),
        ("script", Value::Null),
        ("form", Value::Null),
        ("comment", Value::Null),
        ("style", Value::Null),
        ("meta", Value::Null),
        ("accessibility", Value::Null),
        ("validator", Value::Null),
    ]
}

/// Build a pipeline from an ordered registration list. Skipped registrations
/// (unknown id, bad args) do not fail the build; a stage-order or
/// missing-validator configuration does.
///
/// # Errors
///
/// Returns [`PipelineBuildError`] when the surviving registrations violate
/// the ordering contract.
pub fn build_pipeline(
    registrations: &[(&str, Value)],
) -> Result<SanitizerPipeline, PipelineBuildError> {
    let mut builder = PipelineBuilder::new();
    for (id, args) in registrations {
        let args = if args.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            args.clone()
        };
        if let Some(sanitizer) = build_sanitizer(id, &args) {
            builder.push_boxed(sanitizer);
        }
    }
    builder.build()
}

/// The default pipeline. Its ordering is correct by construction.
#[must_use]
pub fn default_pipeline() -> SanitizerPipeline {
    let registrations = default_registrations();
    let mut sanitizers: Vec<Box<dyn Sanitizer>> = Vec::with_capacity(registrations.len());
    for (id, _) in registrations {
        if let Some(sanitizer) = build_sanitizer(id, &Value::Object(serde_json::Map::new())) {
            sanitizers.push(sanitizer);
        }
    }
    SanitizerPipeline::from_vec(sanitizers)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_pipeline_order() {
        let pipeline = default_pipeline();
        let names = pipeline.names();
        assert_eq!(names.first(), Some(&"embed"));
        assert_eq!(names.last(), Some(&"validator"));
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn test_build_pipeline_skips_unknown_ids() {
        let registrations = vec![
            ("img", Value::Null),
            ("amp-carousel", Value::Null),
            ("validator", Value::Null),
        ];
        let pipeline = build_pipeline(&registrations).unwrap();
        assert_eq!(pipeline.names(), vec!["img", "validator"]);
    }

    #[test]
    fn test_build_pipeline_skips_bad_args() {
        let registrations = vec![
            ("iframe", json!({"add_placeholder": "yes please"})),
            ("validator", Value::Null),
        ];
        let pipeline = build_pipeline(&registrations).unwrap();
        assert_eq!(pipeline.names(), vec!["validator"]);
    }

    #[test]
    fn test_build_pipeline_rejects_missing_validator() {
        let registrations = vec![("img", Value::Null)];
        assert!(build_pipeline(&registrations).is_err());
    }

    #[test]
    fn test_every_default_id_resolves() {
        for (id, _) in default_registrations() {
            let sanitizer = build_sanitizer(id, &Value::Object(serde_json::Map::new()));
            assert_eq!(sanitizer.map(|s| s.name().to_string()), Some(id.to_string()));
        }
    }

    #[test]
    fn test_args_reach_the_sanitizer() {
        let sanitizer = build_sanitizer("iframe", &json!({"add_placeholder": true})).unwrap();
        assert_eq!(sanitizer.name(), "iframe");
    }
}
