use crate::constants::*;

pub const GENERIC_CATEGORY_ERROR: &str = "Something went wrong with the category. Please try again.";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";
pub const NAME_REQUIRED: &str = "Name is required";

const CATEGORY_MESSAGES: &[(&str, &str)] = &[
    (
        CATEGORY_DEPTH_EXCEEDED,
        "Categories can only be nested three levels deep.",
    ),
    (
        CATEGORY_HAS_CHILDREN,
        "This category has subcategories. Delete or move them first.",
    ),
    (
        CATEGORY_NAME_CONFLICT,
        "A category with this name already exists.",
    ),
    (CATEGORY_NOT_FOUND, "Category not found."),
    (
        CATEGORY_VALIDATION_ERROR,
        "Please check the category details and try again.",
    ),
    (
        CATEGORY_CIRCULAR_RELATIONSHIP,
        "A category cannot be placed under itself or its subcategories.",
    ),
    (
        CATEGORY_OWNERSHIP_ERROR,
        "You can only use your own categories.",
    ),
    (UNAUTHORIZED_CODE, SESSION_EXPIRED),
];

/// User-facing text for a category error code; unknown or missing codes get the generic message.
pub fn category_error_message(code: Option<&str>) -> &'static str {
    code.and_then(|code| {
        CATEGORY_MESSAGES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, message)| *message)
    })
    .unwrap_or(GENERIC_CATEGORY_ERROR)
}
