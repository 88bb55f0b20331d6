//! Category lifecycle on a list page: open a modal, submit, then close it or
//! keep it open with the error surfaces filled in.

use thiserror::Error;

use crate::client::categories::CategoryApiClient;
use crate::client::form::{CategoryForm, FormErrors};
use crate::client::http::{ClientError, ClientResult};
use crate::client::messages::category_error_message;
use crate::constants::*;
use crate::models::{Category, CategoryType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMode {
    Create,
    Edit(i64),
    Delete(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionState {
    Idle,
    ModalOpen {
        mode: ModalMode,
        error: Option<FailureMessages>,
    },
    Submitting {
        mode: ModalMode,
    },
}

/// Where a failure is shown. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureMessages {
    pub toast: Option<String>,
    pub form: Option<String>,
    pub name_error: Option<String>,
}

impl FailureMessages {
    fn from_form(errors: FormErrors) -> Self {
        Self {
            toast: errors.form.as_ref().map(|_| category_error_message(errors.code).to_string()),
            form: errors.form,
            name_error: errors.name,
        }
    }

    fn from_client(error: &ClientError) -> Self {
        let mapped = category_error_message(error.code()).to_string();
        let name_error = (error.code() == Some(CATEGORY_NAME_CONFLICT)).then(|| mapped.clone());
        Self {
            toast: Some(mapped),
            form: Some(error.message().to_string()),
            name_error,
        }
    }

    fn not_found(name: &str) -> Self {
        Self {
            toast: Some(category_error_message(Some(CATEGORY_NOT_FOUND)).to_string()),
            form: Some(format!("No category named '{}'", name)),
            name_error: None,
        }
    }

    /// Compares only the surfaces the caller cares about.
    pub fn matches(&self, toast: Option<&str>, form: Option<&str>, name_error: Option<&str>) -> bool {
        let check = |expected: Option<&str>, actual: &Option<String>| {
            expected.is_none_or(|e| actual.as_deref() == Some(e))
        };
        check(toast, &self.toast) && check(form, &self.form) && check(name_error, &self.name_error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Success(Category),
    Deleted,
    Failed(FailureMessages),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ActionOutcome::Failed(_))
    }
}

/// Input for a new category.
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub category_type: Option<CategoryType>,
    pub parent_id: Option<i64>,
}

/// Partial edit. `category_type` is accepted but never applied.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub parent_id: Option<Option<i64>>,
    pub category_type: Option<CategoryType>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ExpectationError {
    #[error("expected the delete to fail, but it succeeded")]
    UnexpectedSuccess,
    #[error("category '{0}' disappeared from the list")]
    NoLongerVisible(String),
    #[error("failure messages did not match: {0:?}")]
    MessageMismatch(FailureMessages),
}

pub struct CategoryActions {
    client: CategoryApiClient,
    state: ActionState,
    categories: Vec<Category>,
}

impl CategoryActions {
    pub fn new(client: CategoryApiClient) -> Self {
        Self {
            client,
            state: ActionState::Idle,
            categories: Vec::new(),
        }
    }

    pub fn state(&self) -> &ActionState {
        &self.state
    }

    /// The list as last loaded.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    /// False while an existing category is being edited.
    pub fn type_field_enabled(&self) -> bool {
        !matches!(
            self.state,
            ActionState::ModalOpen {
                mode: ModalMode::Edit(_),
                ..
            } | ActionState::Submitting {
                mode: ModalMode::Edit(_)
            }
        )
    }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        self.categories = self.client.get_all_categories_flat().await?;
        Ok(())
    }

    /// Closes any open modal.
    pub fn cancel(&mut self) {
        self.state = ActionState::Idle;
    }

    fn fail(&mut self, mode: ModalMode, messages: FailureMessages) -> ActionOutcome {
        tracing::debug!(?mode, ?messages, "category action failed");
        self.state = ActionState::ModalOpen {
            mode,
            error: Some(messages.clone()),
        };
        ActionOutcome::Failed(messages)
    }

    async fn succeed(&mut self, outcome: ActionOutcome) -> ActionOutcome {
        self.state = ActionState::Idle;
        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "category list refresh failed");
        }
        outcome
    }

    pub async fn create_category(&mut self, data: NewCategory) -> ActionOutcome {
        let mode = ModalMode::Create;
        self.state = ActionState::ModalOpen { mode, error: None };

        let mut form = CategoryForm::for_create();
        form.name = data.name;
        if let Some(category_type) = data.category_type {
            form.set_type(category_type);
        }
        form.parent_id = data.parent_id;

        if let Err(errors) = form.validate(&self.categories) {
            return self.fail(mode, FailureMessages::from_form(errors));
        }

        self.state = ActionState::Submitting { mode };
        match self.client.create_category(&form.to_create_payload()).await {
            Ok(category) => self.succeed(ActionOutcome::Success(category)).await,
            Err(e) => self.fail(mode, FailureMessages::from_client(&e)),
        }
    }

    pub async fn edit_category(&mut self, name: &str, patch: CategoryPatch) -> ActionOutcome {
        let Some(existing) = self.find_by_name(name).cloned() else {
            return ActionOutcome::Failed(FailureMessages::not_found(name));
        };
        let mode = ModalMode::Edit(existing.id);
        self.state = ActionState::ModalOpen { mode, error: None };

        let mut form = CategoryForm::for_edit(&existing);
        if let Some(new_name) = patch.name {
            form.name = new_name;
        }
        if let Some(parent_id) = patch.parent_id {
            form.parent_id = parent_id;
        }
        if let Some(category_type) = patch.category_type {
            // Disabled while editing, so this is a no-op
            form.set_type(category_type);
        }

        if let Err(errors) = form.validate(&self.categories) {
            return self.fail(mode, FailureMessages::from_form(errors));
        }

        self.state = ActionState::Submitting { mode };
        match self
            .client
            .update_category(existing.id, &form.to_update_payload())
            .await
        {
            Ok(category) => self.succeed(ActionOutcome::Success(category)).await,
            Err(e) => self.fail(mode, FailureMessages::from_client(&e)),
        }
    }

    pub async fn delete_category(&mut self, name: &str) -> ActionOutcome {
        let Some(existing) = self.find_by_name(name).cloned() else {
            return ActionOutcome::Failed(FailureMessages::not_found(name));
        };
        let mode = ModalMode::Delete(existing.id);
        self.state = ActionState::Submitting { mode };

        match self.client.delete_category(existing.id).await {
            Ok(()) => self.succeed(ActionOutcome::Deleted).await,
            Err(e) => self.fail(mode, FailureMessages::from_client(&e)),
        }
    }

    /// Deletes `name` expecting a rejection: the category must stay listed and
    /// every supplied message must match its surface.
    pub async fn delete_category_and_expect_failure(
        &mut self,
        name: &str,
        toast: Option<&str>,
        form: Option<&str>,
        name_error: Option<&str>,
    ) -> Result<FailureMessages, ExpectationError> {
        let messages = match self.delete_category(name).await {
            ActionOutcome::Failed(messages) => messages,
            _ => return Err(ExpectationError::UnexpectedSuccess),
        };

        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "category list refresh failed");
        }
        if !self.is_visible(name) {
            return Err(ExpectationError::NoLongerVisible(name.to_string()));
        }
        if !messages.matches(toast, form, name_error) {
            return Err(ExpectationError::MessageMismatch(messages));
        }
        Ok(messages)
    }
}
