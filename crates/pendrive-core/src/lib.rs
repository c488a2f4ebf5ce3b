//! pendrive-core: side-effect-free logic shared by every client context.
//!
//! Nothing in this crate performs IO or spawns tasks. The availability
//! transition, the session clearing protocol, the form locator and the
//! autofill executor are all plain functions over owned values so that the
//! background, popup and content contexts can drive them from their own
//! event loops.

pub mod autofill;
pub mod availability;
pub mod error;
pub mod locator;
pub mod matching;
pub mod page;
pub mod rescan;
pub mod session;
pub mod types;

pub use autofill::{FILL_CONFIRMATION, FillOutcome, apply};
pub use availability::{
    AvailabilityState, AvailabilityTransition, ProbeOutcome, transition_availability,
};
pub use error::{PageError, ValidationError};
pub use locator::{FormCandidate, IdentityRule, locate};
pub use matching::DomainMatch;
pub use page::{
    Affordance, AffordanceKind, Container, ContainerKind, FieldEvent, FieldRef, InputElement,
    Mutation, Page, Tone, host_of,
};
pub use rescan::RescanDebouncer;
pub use session::{CredentialDraft, SessionAction, SessionEpoch, SessionState};
pub use types::{AvailabilityEvent, CredentialList, CredentialRecord, StatusReport, Verdict};
