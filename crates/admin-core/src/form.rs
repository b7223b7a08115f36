//! # Authorization-Gated Form Controller
//!
//! Orchestrates draft state, validation, submission, and redirect for one
//! create or edit form, gated by an authorization check.
//!
//! # State Machine
//! `Idle -> Validating -> Submitting -> {Success, Failed}`, with
//! `Failed -> Idle` on the next edit. The capability check runs once at mount
//! and is a hard gate: a denied controller is never constructed, so the
//! interactive state machine cannot be reached without authorization.
//!
//! The draft is owned exclusively by the controller — every mutation goes
//! through `&mut self`, so no outside task can touch form state while a
//! submission is in flight.

use crate::access::{AccessContext, AccessOperation, AccessService};
use crate::client::ResourceClient;
use crate::error::{ApiError, FieldErrors};
use crate::resource::Resource;
use tracing::{debug, info, warn};

/// Where the auth gate redirects on deny.
pub const LANDING_ROUTE: &str = "/";

/// A navigation outcome handed to the routing collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub route: String,
}

impl Navigation {
    pub fn to(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
        }
    }

    /// The unauthenticated landing route used after a denied gate.
    pub fn landing() -> Self {
        Self::to(LANDING_ROUTE)
    }
}

/// Whether the form creates a new record or edits an existing one.
#[derive(Debug, Clone)]
pub enum FormMode<T: Resource> {
    Create,
    Edit(T::Id),
}

/// The submission lifecycle of one form instance.
#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    Idle,
    Validating,
    Submitting,
    Success,
    Failed {
        /// Inline, field-scoped validation messages.
        errors: FieldErrors,
        /// Top-level banner error from the transport, if any.
        banner: Option<ApiError>,
    },
}

/// One mounted create/edit form for a resource.
pub struct FormController<T: Resource> {
    client: ResourceClient<T>,
    mode: FormMode<T>,
    draft: T::Draft,
    state: FormState,
}

impl<T: Resource> FormController<T> {
    /// Mounts the form: runs the capability check for the (service, entity,
    /// operation) triple, then loads the initial draft — empty for create,
    /// prefilled from the loaded record for edit.
    ///
    /// A denied check fails here, before any interactive state exists; the
    /// caller redirects to [`Navigation::landing`].
    pub async fn mount(
        client: ResourceClient<T>,
        access: &AccessContext,
        service: AccessService,
        mode: FormMode<T>,
    ) -> Result<Self, ApiError> {
        let operation = match mode {
            FormMode::Create => AccessOperation::Create,
            FormMode::Edit(_) => AccessOperation::Update,
        };
        access.check(service, T::ENDPOINT, operation)?;

        let draft = match &mode {
            FormMode::Create => T::Draft::default(),
            FormMode::Edit(id) => client.get(id).await?.to_draft(),
        };
        debug!(entity = T::ENDPOINT, %operation, "Form mounted");
        Ok(Self {
            client,
            mode,
            draft,
            state: FormState::Idle,
        })
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn draft(&self) -> &T::Draft {
        &self.draft
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, FormState::Submitting)
    }

    /// Mutates the draft. A failed form returns to `Idle` on the first edit,
    /// clearing its errors.
    pub fn edit(&mut self, apply: impl FnOnce(&mut T::Draft)) {
        if matches!(self.state, FormState::Failed { .. }) {
            self.state = FormState::Idle;
        }
        apply(&mut self.draft);
    }

    /// Validates and submits the draft.
    ///
    /// Returns the navigation to perform on success, `None` otherwise —
    /// failures are presented through [`FormController::state`], never
    /// returned. While a submission is in flight a second trigger is a no-op,
    /// so exactly one mutation reaches the network per submission.
    pub async fn submit(&mut self) -> Option<Navigation> {
        if self.is_submitting() {
            debug!(entity = T::ENDPOINT, "Submit ignored; already submitting");
            return None;
        }

        self.state = FormState::Validating;
        if let Err(errors) = T::schema().validate(&self.draft) {
            warn!(entity = T::ENDPOINT, fields = errors.len(), "Validation failed");
            self.state = FormState::Failed {
                errors,
                banner: None,
            };
            return None;
        }

        self.state = FormState::Submitting;
        let result = match &self.mode {
            FormMode::Create => self.client.create(&self.draft).await.map(|_| ()),
            FormMode::Edit(id) => {
                let patch = T::Patch::from(&self.draft);
                self.client.update(id, &patch).await.map(|_| ())
            }
        };

        match result {
            Ok(()) => {
                info!(entity = T::ENDPOINT, "Submitted");
                self.draft = T::Draft::default();
                self.state = FormState::Success;
                Some(self.list_route())
            }
            Err(error) => {
                warn!(entity = T::ENDPOINT, error = %error, "Submission failed");
                self.state = FormState::Failed {
                    errors: FieldErrors::new(),
                    banner: Some(error),
                };
                None
            }
        }
    }

    /// Navigates to the entity's list route without persisting anything.
    pub fn cancel(&self) -> Navigation {
        self.list_route()
    }

    fn list_route(&self) -> Navigation {
        Navigation::to(format!("/{}", T::ENDPOINT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::query::{Filter, FilterMatch, ResourceQuery};
    use crate::schema::Schema;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Arc;
    use crate::transport::Method;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Note {
        id: String,
        title: String,
    }

    #[derive(Debug, Clone, Default, Serialize)]
    struct NoteDraft {
        title: String,
    }

    #[derive(Debug, Serialize)]
    struct NotePatch {
        title: Option<String>,
    }

    impl From<&NoteDraft> for NotePatch {
        fn from(draft: &NoteDraft) -> Self {
            Self {
                title: Some(draft.title.clone()),
            }
        }
    }

    #[derive(Debug, Default)]
    struct NoteFilter {
        title: Option<String>,
    }

    impl ResourceQuery for NoteFilter {
        fn filters(&self) -> Vec<Filter> {
            self.title
                .iter()
                .map(|title| Filter {
                    field: "title",
                    matching: FilterMatch::Contains(title.clone()),
                })
                .collect()
        }
    }

    impl Resource for Note {
        const ENDPOINT: &'static str = "notes";
        const DISPLAY_FIELD: &'static str = "title";
        type Id = String;
        type Draft = NoteDraft;
        type Patch = NotePatch;
        type Filter = NoteFilter;

        fn id(&self) -> &String {
            &self.id
        }

        fn display_label(&self) -> String {
            self.title.clone()
        }

        fn schema() -> Schema {
            Schema::new("notes").text("title", true, Some(40))
        }

        fn search_filter(text: &str) -> NoteFilter {
            NoteFilter {
                title: (!text.is_empty()).then(|| text.to_string()),
            }
        }

        fn to_draft(&self) -> NoteDraft {
            NoteDraft {
                title: self.title.clone(),
            }
        }
    }

    fn granted() -> AccessContext {
        AccessContext::new().with_full_access(AccessService::Project, "notes")
    }

    async fn mounted(mock: &MockTransport) -> FormController<Note> {
        let client = ResourceClient::<Note>::new(Arc::new(mock.clone()));
        FormController::mount(client, &granted(), AccessService::Project, FormMode::Create)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn invalid_draft_fails_without_a_network_call() {
        let mock = MockTransport::new();
        let mut form = mounted(&mock).await;

        let navigation = form.submit().await;
        assert_eq!(navigation, None);
        match form.state() {
            FormState::Failed { errors, banner } => {
                assert_eq!(errors.len(), 1);
                assert!(errors.contains_key("title"));
                assert_eq!(*banner, None);
            }
            state => panic!("expected Failed, got {state:?}"),
        }
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn valid_draft_submits_once_and_navigates() {
        let mock = MockTransport::new();
        mock.expect(Method::Post, "/notes")
            .return_ok(json!({ "id": "notes_1", "title": "hello" }));
        let mut form = mounted(&mock).await;

        form.edit(|draft| draft.title = "hello".to_string());
        let navigation = form.submit().await;
        assert_eq!(navigation, Some(Navigation::to("/notes")));
        assert_eq!(*form.state(), FormState::Success);
        assert_eq!(mock.calls(Method::Post, "/notes"), 1);
        mock.verify();
    }

    #[tokio::test]
    async fn submit_while_submitting_is_a_no_op() {
        let mock = MockTransport::new();
        let mut form = mounted(&mock).await;
        form.edit(|draft| draft.title = "hello".to_string());

        // Force the in-flight state as a second trigger would observe it.
        form.state = FormState::Submitting;
        let navigation = form.submit().await;
        assert_eq!(navigation, None);
        assert!(form.is_submitting());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_banner_and_clears_on_edit() {
        let mock = MockTransport::new();
        mock.expect(Method::Post, "/notes")
            .return_err(ApiError::Network("connection reset".to_string()));
        let mut form = mounted(&mock).await;

        form.edit(|draft| draft.title = "hello".to_string());
        assert_eq!(form.submit().await, None);
        match form.state() {
            FormState::Failed { errors, banner } => {
                assert!(errors.is_empty());
                assert_eq!(
                    *banner,
                    Some(ApiError::Network("connection reset".to_string()))
                );
            }
            state => panic!("expected Failed, got {state:?}"),
        }

        // Next edit returns the form to Idle.
        form.edit(|draft| draft.title = "hello again".to_string());
        assert_eq!(*form.state(), FormState::Idle);
    }

    #[tokio::test]
    async fn denied_mount_never_constructs_the_form() {
        let mock = MockTransport::new();
        let client = ResourceClient::<Note>::new(Arc::new(mock.clone()));
        let err = FormController::mount(
            client,
            &AccessContext::new(),
            AccessService::Project,
            FormMode::<Note>::Create,
        )
        .await
        .err();
        assert_eq!(
            err,
            Some(ApiError::Unauthorized {
                service: AccessService::Project,
                entity: "notes".to_string(),
                operation: AccessOperation::Create,
            })
        );
        assert!(mock.requests().is_empty());
        assert_eq!(Navigation::landing(), Navigation::to("/"));
    }

    #[tokio::test]
    async fn cancel_navigates_to_the_list_route_without_persisting() {
        let mock = MockTransport::new();
        let form = mounted(&mock).await;
        assert_eq!(form.cancel(), Navigation::to("/notes"));
        assert!(mock.requests().is_empty());
    }
}
