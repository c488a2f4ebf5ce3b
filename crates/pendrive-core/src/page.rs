//! In-memory page model the content context operates on.
//!
//! Mirrors just enough of a document for form detection and autofill:
//! containers (`<form>` elements plus the implicit formless document scope)
//! holding input elements, and the affordances the client injected into the
//! page. Snapshots are loaded from JSON.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::PageError;

// ─── Inputs ───────────────────────────────────────────────────────

/// Notification dispatched on a field after its value is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldEvent {
    Input,
    Change,
}

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InputElement {
    #[serde(rename = "type", default = "default_input_type")]
    pub input_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub value: String,
    /// Events dispatched on this element, in order.
    #[serde(skip)]
    pub dispatched: Vec<FieldEvent>,
}

fn default_input_type() -> String {
    "text".to_string()
}

impl InputElement {
    pub fn new(input_type: &str) -> Self {
        Self {
            input_type: input_type.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn is_type(&self, input_type: &str) -> bool {
        self.input_type.eq_ignore_ascii_case(input_type)
    }

    pub fn is_password(&self) -> bool {
        self.is_type("password")
    }

    /// Set the value and dispatch `input` then `change`, as a user edit would.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.dispatched.push(FieldEvent::Input);
        self.dispatched.push(FieldEvent::Change);
    }
}

impl fmt::Debug for InputElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputElement")
            .field("type", &self.input_type)
            .field("name", &self.name)
            .field("id", &self.id)
            .field("placeholder", &self.placeholder)
            .field("value_len", &self.value.len())
            .field("dispatched", &self.dispatched)
            .finish()
    }
}

// ─── Containers ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Form,
    /// Inputs that live outside any `<form>`.
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub kind: ContainerKind,
    pub id: String,
    pub inputs: Vec<InputElement>,
}

impl Container {
    pub fn form(id: &str, inputs: Vec<InputElement>) -> Self {
        Self {
            kind: ContainerKind::Form,
            id: id.to_string(),
            inputs,
        }
    }

    pub fn document(inputs: Vec<InputElement>) -> Self {
        Self {
            kind: ContainerKind::Document,
            id: String::new(),
            inputs,
        }
    }
}

/// Reference to one input: container index + input index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub container: usize,
    pub input: usize,
}

// ─── Affordances ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffordanceKind {
    /// "Fill from Pendrive" button anchored next to a container.
    FillButton { container: usize },
    /// Auto-dismissing message overlay.
    Toast { message: String, tone: Tone },
}

/// Something the client injected into the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affordance {
    pub id: u64,
    pub kind: AffordanceKind,
    pub shown_at: Instant,
    pub ttl: Option<Duration>,
}

impl Affordance {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(self.shown_at) >= ttl)
    }
}

// ─── Mutations ────────────────────────────────────────────────────

/// Structural-change notification reported by the hosting page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    ChildList {
        added_elements: usize,
        added_text_nodes: usize,
    },
    CharacterData,
    Attributes,
}

impl Mutation {
    /// Only newly added element nodes can introduce new forms.
    pub fn adds_elements(&self) -> bool {
        matches!(self, Self::ChildList { added_elements, .. } if *added_elements > 0)
    }
}

// ─── Page ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub containers: Vec<Container>,
    affordances: Vec<Affordance>,
    next_affordance_id: u64,
}

#[derive(Debug, Deserialize)]
struct PageSnapshot {
    url: String,
    #[serde(default)]
    forms: Vec<FormSnapshot>,
    #[serde(default)]
    inputs: Vec<InputElement>,
}

#[derive(Debug, Deserialize)]
struct FormSnapshot {
    #[serde(default)]
    id: String,
    #[serde(default)]
    inputs: Vec<InputElement>,
}

impl Page {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            containers: Vec::new(),
            affordances: Vec::new(),
            next_affordance_id: 1,
        }
    }

    /// Parse a JSON snapshot of the form `{url, forms: [{id, inputs}], inputs}`.
    ///
    /// Top-level `inputs` become a single formless document container.
    pub fn from_json(json: &str) -> Result<Self, PageError> {
        let snapshot: PageSnapshot = serde_json::from_str(json)?;
        if snapshot.url.trim().is_empty() {
            return Err(PageError::MissingUrl);
        }
        let mut page = Self::new(&snapshot.url);
        for form in snapshot.forms {
            page.containers.push(Container::form(&form.id, form.inputs));
        }
        if !snapshot.inputs.is_empty() {
            page.containers.push(Container::document(snapshot.inputs));
        }
        Ok(page)
    }

    #[must_use]
    pub fn with_container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    /// Append a container as a late-rendered form would be, returning the
    /// mutation record the page would report.
    pub fn append_container(&mut self, container: Container) -> Mutation {
        let added_elements = 1 + container.inputs.len();
        self.containers.push(container);
        Mutation::ChildList {
            added_elements,
            added_text_nodes: 0,
        }
    }

    /// Host name of the page URL, lowercased, without port or credentials.
    pub fn host(&self) -> Option<String> {
        host_of(&self.url)
    }

    pub fn field(&self, field: FieldRef) -> Option<&InputElement> {
        self.containers
            .get(field.container)
            .and_then(|c| c.inputs.get(field.input))
    }

    pub fn field_mut(&mut self, field: FieldRef) -> Option<&mut InputElement> {
        self.containers
            .get_mut(field.container)
            .and_then(|c| c.inputs.get_mut(field.input))
    }

    pub fn affordances(&self) -> &[Affordance] {
        &self.affordances
    }

    pub fn inject(&mut self, kind: AffordanceKind, now: Instant, ttl: Option<Duration>) -> u64 {
        let id = self.next_affordance_id;
        self.next_affordance_id += 1;
        self.affordances.push(Affordance {
            id,
            kind,
            shown_at: now,
            ttl,
        });
        id
    }

    pub fn remove_fill_buttons(&mut self) -> usize {
        let before = self.affordances.len();
        self.affordances
            .retain(|a| !matches!(a.kind, AffordanceKind::FillButton { .. }));
        before - self.affordances.len()
    }

    /// Drop toasts whose display time has elapsed.
    pub fn expire_affordances(&mut self, now: Instant) -> usize {
        let before = self.affordances.len();
        self.affordances.retain(|a| !a.is_expired(now));
        before - self.affordances.len()
    }

    /// Remove every injected affordance. Returns how many were removed.
    pub fn clear_affordances(&mut self) -> usize {
        let removed = self.affordances.len();
        self.affordances.clear();
        removed
    }
}

/// Extract the lowercased host name from an absolute URL.
pub fn host_of(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let authority = authority.rsplit_once('@').map_or(authority, |(_, h)| h);

    let host = if let Some(stripped) = authority.strip_prefix('[') {
        stripped.split(']').next().unwrap_or_default()
    } else {
        authority.split(':').next().unwrap_or_default()
    };

    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_of_strips_port_path_and_userinfo() {
        assert_eq!(
            host_of("https://user:pw@Login.Example.com:8443/a?b#c"),
            Some("login.example.com".to_string())
        );
        assert_eq!(host_of("http://[::1]:5000/"), Some("::1".to_string()));
        assert_eq!(host_of("about:blank"), None);
        assert_eq!(host_of("file:///tmp/x.html"), None);
    }

    #[test]
    fn snapshot_builds_form_and_document_containers() {
        let json = r#"{
            "url": "https://example.com/login",
            "forms": [
                {"id": "login", "inputs": [
                    {"type": "email", "name": "login"},
                    {"type": "password", "name": "pw"}
                ]}
            ],
            "inputs": [{"name": "search"}]
        }"#;
        let page = Page::from_json(json).expect("valid snapshot");
        assert_eq!(page.containers.len(), 2);
        assert_eq!(page.containers[0].kind, ContainerKind::Form);
        assert_eq!(page.containers[1].kind, ContainerKind::Document);
        assert_eq!(page.containers[1].inputs[0].input_type, "text");
    }

    #[test]
    fn snapshot_without_url_is_rejected() {
        let err = Page::from_json(r#"{"url": ""}"#).expect_err("missing url");
        assert!(matches!(err, PageError::MissingUrl));
    }

    #[test]
    fn set_value_dispatches_input_then_change() {
        let mut input = InputElement::new("text");
        input.set_value("ann");
        assert_eq!(input.value, "ann");
        assert_eq!(input.dispatched, vec![FieldEvent::Input, FieldEvent::Change]);
    }

    #[test]
    fn input_debug_hides_value() {
        let mut input = InputElement::new("password");
        input.set_value("hunter2");
        assert!(!format!("{input:?}").contains("hunter2"));
    }

    #[test]
    fn toasts_expire_buttons_do_not() {
        let mut page = Page::new("https://example.com");
        let t0 = Instant::now();
        page.inject(AffordanceKind::FillButton { container: 0 }, t0, None);
        page.inject(
            AffordanceKind::Toast {
                message: "ok".into(),
                tone: Tone::Success,
            },
            t0,
            Some(Duration::from_secs(3)),
        );
        assert_eq!(page.expire_affordances(t0 + Duration::from_secs(1)), 0);
        assert_eq!(page.expire_affordances(t0 + Duration::from_secs(3)), 1);
        assert_eq!(page.affordances().len(), 1);
        assert_eq!(page.clear_affordances(), 1);
        assert!(page.affordances().is_empty());
    }

    #[test]
    fn text_only_mutations_are_not_structural() {
        assert!(!Mutation::CharacterData.adds_elements());
        assert!(!Mutation::Attributes.adds_elements());
        assert!(
            !Mutation::ChildList {
                added_elements: 0,
                added_text_nodes: 3
            }
            .adds_elements()
        );
        let mut page = Page::new("https://example.com");
        let m = page.append_container(Container::form("late", vec![InputElement::new("password")]));
        assert!(m.adds_elements());
    }
}
