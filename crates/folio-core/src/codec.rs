use std::collections::HashMap;

use crate::error::PermissionError;
use crate::types::{Action, ResourceKind};

/// Substitution slot for the action verb inside a template.
pub const PLACEHOLDER: &str = "%s";
/// Separates the verb from the resource noun in a permission code.
pub const SEPARATOR: char = '_';

/// Encodes (action, kind) pairs into backend permission codes and back.
///
/// Templates are validated as they are registered, so a constructed codec
/// always has one template per kind and one kind per template.
#[derive(Debug, Clone, Default)]
pub struct PermissionCodec {
    templates: HashMap<ResourceKind, String>,
    kinds_by_template: HashMap<String, ResourceKind>,
    /// Registration order, for stable listings.
    order: Vec<ResourceKind>,
}

/// Builds a [`PermissionCodec`], failing on the first invalid registration.
#[derive(Debug, Default)]
pub struct CodecBuilder {
    codec: PermissionCodec,
}

impl CodecBuilder {
    /// Register every built-in kind with its backend template.
    pub fn with_builtin(mut self) -> Result<Self, PermissionError> {
        for kind in ResourceKind::builtin() {
            if let Some(template) = kind.builtin_template() {
                self = self.register(kind, template)?;
            }
        }
        Ok(self)
    }

    pub fn register(
        mut self,
        kind: ResourceKind,
        template: impl Into<String>,
    ) -> Result<Self, PermissionError> {
        let template = template.into();
        validate_template(&template)?;

        if self.codec.templates.contains_key(&kind) {
            return Err(PermissionError::DuplicateKind(kind));
        }
        if let Some(existing) = self.codec.kinds_by_template.get(&template) {
            return Err(PermissionError::AmbiguousTemplate {
                template,
                existing: existing.clone(),
                incoming: kind,
            });
        }

        self.codec
            .kinds_by_template
            .insert(template.clone(), kind.clone());
        self.codec.templates.insert(kind.clone(), template);
        self.codec.order.push(kind);
        Ok(self)
    }

    pub fn build(self) -> PermissionCodec {
        self.codec
    }
}

fn validate_template(template: &str) -> Result<(), PermissionError> {
    let malformed = || PermissionError::MalformedTemplate(template.to_string());
    let noun = template
        .strip_prefix(PLACEHOLDER)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
        .ok_or_else(malformed)?;
    if noun.is_empty() || noun.contains('%') || noun.chars().any(char::is_whitespace) {
        return Err(malformed());
    }
    Ok(())
}

impl PermissionCodec {
    pub fn builder() -> CodecBuilder {
        CodecBuilder::default()
    }

    /// Codec covering the built-in kinds only.
    pub fn builtin() -> Result<Self, PermissionError> {
        Ok(Self::builder().with_builtin()?.build())
    }

    /// `encode(View, Document)` is `"view_document"`.
    pub fn encode(&self, action: Action, kind: &ResourceKind) -> Result<String, PermissionError> {
        let template = self
            .templates
            .get(kind)
            .ok_or_else(|| PermissionError::InvalidKind(kind.clone()))?;
        Ok(template.replacen(PLACEHOLDER, action.verb(), 1))
    }

    pub fn decode(&self, code: &str) -> Result<(Action, ResourceKind), PermissionError> {
        let unrecognized = || PermissionError::UnrecognizedCode(code.to_string());

        let (action, rest) = Action::ALL
            .into_iter()
            .find_map(|action| {
                code.strip_prefix(action.verb())
                    .filter(|rest| rest.starts_with(SEPARATOR))
                    .map(|rest| (action, rest))
            })
            .ok_or_else(unrecognized)?;

        let residual = format!("{PLACEHOLDER}{rest}");
        let kind = self
            .kinds_by_template
            .get(&residual)
            .ok_or_else(unrecognized)?;
        Ok((action, kind.clone()))
    }

    pub fn template(&self, kind: &ResourceKind) -> Option<&str> {
        self.templates.get(kind).map(String::as_str)
    }

    pub fn contains(&self, kind: &ResourceKind) -> bool {
        self.templates.contains_key(kind)
    }

    /// Registered kinds in registration order.
    pub fn kinds(&self) -> &[ResourceKind] {
        &self.order
    }

    /// The four codes of one kind, in [`Action::ALL`] order.
    pub fn codes_for(&self, kind: &ResourceKind) -> Result<Vec<String>, PermissionError> {
        Action::ALL
            .into_iter()
            .map(|action| self.encode(action, kind))
            .collect()
    }

    /// Every code this codec can produce.
    pub fn all_codes(&self) -> Vec<String> {
        self.order
            .iter()
            .flat_map(|kind| {
                let template = &self.templates[kind];
                Action::ALL
                    .into_iter()
                    .map(move |action| template.replacen(PLACEHOLDER, action.verb(), 1))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow() -> ResourceKind {
        ResourceKind::Custom("workflow".into())
    }

    #[test]
    fn encode_examples() {
        let codec = PermissionCodec::builtin().unwrap();
        assert_eq!(
            codec.encode(Action::View, &ResourceKind::Document).unwrap(),
            "view_document"
        );
        assert_eq!(
            codec.encode(Action::Delete, &ResourceKind::Task).unwrap(),
            "delete_paperlesstask"
        );
        assert_eq!(
            codec.encode(Action::Change, &ResourceKind::Admin).unwrap(),
            "change_logentry"
        );
    }

    #[test]
    fn decode_examples() {
        let codec = PermissionCodec::builtin().unwrap();
        assert_eq!(
            codec.decode("view_document").unwrap(),
            (Action::View, ResourceKind::Document)
        );
        assert_eq!(
            codec.decode("add_documenttype").unwrap(),
            (Action::Add, ResourceKind::DocumentType)
        );
        assert_eq!(
            codec.decode("frobnicate"),
            Err(PermissionError::UnrecognizedCode("frobnicate".into()))
        );
    }

    #[test]
    fn roundtrip_all_builtin_pairs() {
        let codec = PermissionCodec::builtin().unwrap();
        for kind in codec.kinds() {
            for action in Action::ALL {
                let code = codec.encode(action, kind).unwrap();
                assert_eq!(codec.decode(&code).unwrap(), (action, kind.clone()));
            }
        }
        assert_eq!(codec.all_codes().len(), ResourceKind::builtin().len() * 4);
    }

    #[test]
    fn decode_requires_separator_after_verb() {
        let codec = PermissionCodec::builtin().unwrap();
        for code in ["viewdocument", "view_", "view", "_document", "review_document"] {
            assert!(
                matches!(codec.decode(code), Err(PermissionError::UnrecognizedCode(_))),
                "{code} should not decode"
            );
        }
    }

    #[test]
    fn decode_unknown_noun_fails() {
        let codec = PermissionCodec::builtin().unwrap();
        assert_eq!(
            codec.decode("view_workflow"),
            Err(PermissionError::UnrecognizedCode("view_workflow".into()))
        );
    }

    #[test]
    fn unregistered_kind_is_invalid() {
        let codec = PermissionCodec::builtin().unwrap();
        assert_eq!(
            codec.encode(Action::Add, &workflow()),
            Err(PermissionError::InvalidKind(workflow()))
        );
    }

    #[test]
    fn custom_kind_roundtrip() {
        let codec = PermissionCodec::builder()
            .with_builtin()
            .unwrap()
            .register(workflow(), "%s_workflow")
            .unwrap()
            .build();
        assert_eq!(
            codec.encode(Action::Change, &workflow()).unwrap(),
            "change_workflow"
        );
        assert_eq!(
            codec.decode("change_workflow").unwrap(),
            (Action::Change, workflow())
        );
        assert_eq!(codec.kinds().last(), Some(&workflow()));
    }

    #[test]
    fn duplicate_template_rejected_at_construction() {
        let err = PermissionCodec::builder()
            .with_builtin()
            .unwrap()
            .register(workflow(), "%s_document")
            .unwrap_err();
        assert_eq!(
            err,
            PermissionError::AmbiguousTemplate {
                template: "%s_document".into(),
                existing: ResourceKind::Document,
                incoming: workflow(),
            }
        );
    }

    #[test]
    fn duplicate_kind_rejected() {
        let err = PermissionCodec::builder()
            .register(workflow(), "%s_workflow")
            .unwrap()
            .register(workflow(), "%s_flow")
            .unwrap_err();
        assert_eq!(err, PermissionError::DuplicateKind(workflow()));
    }

    #[test]
    fn malformed_templates_rejected() {
        for template in ["workflow", "%s_", "%sworkflow", "workflow_%s", "%s_%s", "%s_work flow"] {
            let result = PermissionCodec::builder().register(workflow(), template);
            assert!(
                matches!(result, Err(PermissionError::MalformedTemplate(_))),
                "{template} should be rejected"
            );
        }
    }

    #[test]
    fn codes_for_kind() {
        let codec = PermissionCodec::builtin().unwrap();
        assert_eq!(
            codec.codes_for(&ResourceKind::Tag).unwrap(),
            vec!["add_tag", "view_tag", "change_tag", "delete_tag"]
        );
    }
}
