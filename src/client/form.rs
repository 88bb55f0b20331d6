use crate::client::messages::{NAME_REQUIRED, category_error_message};
use crate::constants::*;
use crate::models::{Category, CategoryType, CreateCategoryPayload, UpdateCategoryPayload};
use crate::tree::{self, TreeViolation};

/// Errors found before anything is sent. Each surface is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    pub name: Option<String>,
    pub form: Option<String>,
    pub code: Option<&'static str>,
}

/// Create/edit form state for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryForm {
    pub name: String,
    pub category_type: CategoryType,
    pub parent_id: Option<i64>,
    editing: Option<Category>,
}

impl CategoryForm {
    pub fn for_create() -> Self {
        Self {
            name: String::new(),
            category_type: CategoryType::Expense,
            parent_id: None,
            editing: None,
        }
    }

    pub fn for_edit(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            category_type: category.category_type,
            parent_id: category.parent_id,
            editing: Some(category.clone()),
        }
    }

    /// The type selector is read-only once a category exists.
    pub fn type_field_enabled(&self) -> bool {
        self.editing.is_none()
    }

    /// Sets the type; ignored while editing.
    pub fn set_type(&mut self, category_type: CategoryType) {
        if self.type_field_enabled() {
            self.category_type = category_type;
        }
    }

    /// Parents the selector may offer, given the user's flat category list.
    pub fn parent_candidates<'a>(&self, all: &'a [Category]) -> Vec<&'a Category> {
        tree::parent_candidates(all, self.editing.as_ref())
    }

    /// Synchronous checks run before submitting: a non-blank name, and a parent
    /// that keeps the hierarchy acyclic and within the depth cap.
    pub fn validate(&self, all: &[Category]) -> Result<(), FormErrors> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormErrors {
                name: Some(NAME_REQUIRED.to_string()),
                form: None,
                code: Some(CATEGORY_VALIDATION_ERROR),
            });
        }
        if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
            return Err(FormErrors {
                name: Some(format!(
                    "Name must be less than {} characters",
                    MAX_CATEGORY_NAME_LENGTH
                )),
                form: None,
                code: Some(CATEGORY_VALIDATION_ERROR),
            });
        }

        // Unchanged parent on edit needs no check
        let parent_changed = self
            .editing
            .as_ref()
            .is_none_or(|c| c.parent_id != self.parent_id);
        if !parent_changed {
            return Ok(());
        }
        match tree::validate_parent(self.editing.as_ref(), self.parent_id, all) {
            // The cached list can be stale or truncated; the server decides
            Ok(()) | Err(TreeViolation::ParentNotFound) => Ok(()),
            Err(violation) => Err(FormErrors {
                name: None,
                form: Some(category_error_message(Some(violation.code())).to_string()),
                code: Some(violation.code()),
            }),
        }
    }

    pub fn to_create_payload(&self) -> CreateCategoryPayload {
        CreateCategoryPayload {
            name: self.name.trim().to_string(),
            category_type: self.category_type,
            parent_id: self.parent_id,
        }
    }

    /// Only changed fields are sent; the type never is.
    pub fn to_update_payload(&self) -> UpdateCategoryPayload {
        let name = self.name.trim().to_string();
        match &self.editing {
            Some(original) => UpdateCategoryPayload {
                name: (original.name != name).then_some(name),
                parent_id: (original.parent_id != self.parent_id).then_some(self.parent_id),
            },
            None => UpdateCategoryPayload {
                name: Some(name),
                parent_id: Some(self.parent_id),
            },
        }
    }
}
