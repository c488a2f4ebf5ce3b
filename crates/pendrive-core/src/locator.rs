//! Login form detection.
//!
//! The identity-field heuristic is an ordered rule list evaluated
//! first-match-wins. The order is policy: an `email`-typed input beats any
//! attribute match, `name` beats `id`, and `id` beats `placeholder`. Once a
//! rule matches, later rules are not consulted even if they would pick a
//! different element.

use crate::page::{ContainerKind, FieldRef, InputElement, Page};

/// One step of the identity-field heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRule {
    EmailType,
    NameContains(&'static str),
    IdContains(&'static str),
    PlaceholderContains(&'static str),
}

/// Rule evaluation order.
pub const IDENTITY_RULES: [IdentityRule; 7] = [
    IdentityRule::EmailType,
    IdentityRule::NameContains("user"),
    IdentityRule::NameContains("email"),
    IdentityRule::IdContains("user"),
    IdentityRule::IdContains("email"),
    IdentityRule::PlaceholderContains("user"),
    IdentityRule::PlaceholderContains("email"),
];

impl IdentityRule {
    pub fn matches(self, input: &InputElement) -> bool {
        // A password box is never the identity field, whatever its name says.
        if input.is_password() {
            return false;
        }
        match self {
            Self::EmailType => input.is_type("email"),
            Self::NameContains(token) => contains_ignore_case(&input.name, token),
            Self::IdContains(token) => contains_ignore_case(&input.id, token),
            Self::PlaceholderContains(token) => contains_ignore_case(&input.placeholder, token),
        }
    }
}

fn contains_ignore_case(haystack: &str, token: &str) -> bool {
    haystack.to_ascii_lowercase().contains(token)
}

/// Best-guess login fields within one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormCandidate {
    pub container: usize,
    pub kind: ContainerKind,
    pub username_field: Option<FieldRef>,
    pub password_field: Option<FieldRef>,
    /// Rule that selected the identity field, if any.
    pub matched_rule: Option<IdentityRule>,
}

impl FormCandidate {
    pub fn is_complete(&self) -> bool {
        self.username_field.is_some() && self.password_field.is_some()
    }
}

/// Scan every container of the page and return one candidate per container
/// that holds a password-typed input.
pub fn locate(page: &Page) -> Vec<FormCandidate> {
    page.containers
        .iter()
        .enumerate()
        .filter_map(|(ci, container)| {
            let password_index = container.inputs.iter().position(InputElement::is_password)?;

            let identity = IDENTITY_RULES.iter().find_map(|rule| {
                container
                    .inputs
                    .iter()
                    .position(|input| rule.matches(input))
                    .map(|index| (*rule, index))
            });

            Some(FormCandidate {
                container: ci,
                kind: container.kind,
                username_field: identity.map(|(_, input)| FieldRef {
                    container: ci,
                    input,
                }),
                password_field: Some(FieldRef {
                    container: ci,
                    input: password_index,
                }),
                matched_rule: identity.map(|(rule, _)| rule),
            })
        })
        .collect()
}
