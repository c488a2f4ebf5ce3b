//! Writes a credential into a located form.

use std::time::{Duration, Instant};

use crate::locator::FormCandidate;
use crate::page::{AffordanceKind, FieldRef, Page, Tone};
use crate::types::CredentialRecord;

/// How long the fill confirmation stays on the page.
pub const CONFIRMATION_TTL_SECS: u64 = 3;

pub const FILL_CONFIRMATION: &str = "Password filled successfully!";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FillOutcome {
    pub username_set: bool,
    pub password_set: bool,
    /// Id of the confirmation toast, when one was shown.
    pub confirmation: Option<u64>,
}

impl FillOutcome {
    pub fn any_set(&self) -> bool {
        self.username_set || self.password_set
    }
}

/// Fill `record` into `candidate`'s fields.
///
/// Each field that is present gets its value set followed by `input` and
/// `change` notifications; frameworks that track state through events would
/// otherwise keep the old value. Absent or stale field references are
/// skipped. A confirmation toast is injected only if something was written.
pub fn apply(
    page: &mut Page,
    candidate: &FormCandidate,
    record: &CredentialRecord,
    now: Instant,
) -> FillOutcome {
    let username_set = set_field(page, candidate.username_field, &record.username);
    let password_set = set_field(page, candidate.password_field, &record.secret);

    let confirmation = (username_set || password_set).then(|| {
        page.inject(
            AffordanceKind::Toast {
                message: FILL_CONFIRMATION.to_string(),
                tone: Tone::Success,
            },
            now,
            Some(Duration::from_secs(CONFIRMATION_TTL_SECS)),
        )
    });

    FillOutcome {
        username_set,
        password_set,
        confirmation,
    }
}

fn set_field(page: &mut Page, field: Option<FieldRef>, value: &str) -> bool {
    match field.and_then(|f| page.field_mut(f)) {
        Some(input) => {
            input.set_value(value);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::locate;
    use crate::page::{Container, ContainerKind, FieldEvent, InputElement};

    fn login_page() -> Page {
        Page::new("https://example.com/login").with_container(Container::form(
            "login",
            vec![
                InputElement::new("email").with_name("email"),
                InputElement::new("password").with_name("pw"),
            ],
        ))
    }

    fn record() -> CredentialRecord {
        CredentialRecord::new("example.com", "ann@example.com", "hunter2")
    }

    #[test]
    fn fills_both_fields_and_dispatches_events() {
        let mut page = login_page();
        let candidate = locate(&page).remove(0);
        let outcome = apply(&mut page, &candidate, &record(), Instant::now());

        assert!(outcome.username_set && outcome.password_set);
        let user = &page.containers[0].inputs[0];
        let pass = &page.containers[0].inputs[1];
        assert_eq!(user.value, "ann@example.com");
        assert_eq!(pass.value, "hunter2");
        assert_eq!(user.dispatched, vec![FieldEvent::Input, FieldEvent::Change]);
        assert_eq!(pass.dispatched, vec![FieldEvent::Input, FieldEvent::Change]);
    }

    #[test]
    fn confirmation_toast_expires_after_ttl() {
        let mut page = login_page();
        let candidate = locate(&page).remove(0);
        let t0 = Instant::now();
        let outcome = apply(&mut page, &candidate, &record(), t0);

        assert!(outcome.confirmation.is_some());
        assert_eq!(page.affordances().len(), 1);
        page.expire_affordances(t0 + Duration::from_secs(CONFIRMATION_TTL_SECS));
        assert!(page.affordances().is_empty());
    }

    #[test]
    fn password_only_candidate_sets_password() {
        let mut page = Page::new("https://example.com").with_container(Container::form(
            "pin",
            vec![InputElement::new("password")],
        ));
        let candidate = locate(&page).remove(0);
        let outcome = apply(&mut page, &candidate, &record(), Instant::now());
        assert!(!outcome.username_set);
        assert!(outcome.password_set);
        assert!(outcome.confirmation.is_some());
    }

    #[test]
    fn empty_candidate_is_a_no_op() {
        let mut page = login_page();
        let candidate = FormCandidate {
            container: 0,
            kind: ContainerKind::Form,
            username_field: None,
            password_field: None,
            matched_rule: None,
        };
        let outcome = apply(&mut page, &candidate, &record(), Instant::now());
        assert_eq!(outcome, FillOutcome::default());
        assert!(page.affordances().is_empty());
        assert!(page.containers[0].inputs[0].dispatched.is_empty());
    }

    #[test]
    fn stale_field_reference_is_skipped() {
        let mut page = login_page();
        let candidate = FormCandidate {
            container: 4,
            kind: ContainerKind::Form,
            username_field: Some(FieldRef {
                container: 4,
                input: 0,
            }),
            password_field: Some(FieldRef {
                container: 0,
                input: 9,
            }),
            matched_rule: None,
        };
        let outcome = apply(&mut page, &candidate, &record(), Instant::now());
        assert!(!outcome.any_set());
        assert!(page.affordances().is_empty());
    }
}
