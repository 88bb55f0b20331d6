use std::sync::Once;

use crate::constants::*;
use crate::errors::ServiceError;

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber. `RUST_LOG` wins over the defaults.
pub fn init_tracing(debug: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let default_level = if debug { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("category_ledger={}", default_level)));

        fmt().with_env_filter(filter).init();
    });
}

pub fn db_error() -> ServiceError {
    ServiceError::Database(ERR_DATABASE_OPERATION.to_string())
}

pub fn db_error_with_context(context: &str) -> ServiceError {
    ServiceError::Database(context.to_string())
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!(
            "{} cannot be empty",
            field_name
        )));
    }
    if value.trim().chars().count() > max_length {
        return Err(ServiceError::Validation(format!(
            "{} must be less than {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

pub fn validate_page(page: Option<u32>) -> Result<u32, ServiceError> {
    match page {
        Some(0) => Err(ServiceError::Validation(
            "Page must be greater than 0".to_string(),
        )),
        Some(p) => Ok(p),
        None => Ok(DEFAULT_PAGE),
    }
}

pub fn validate_page_size(size: Option<u32>) -> Result<u32, ServiceError> {
    match size {
        Some(0) => Err(ServiceError::Validation(
            "Size must be greater than 0".to_string(),
        )),
        Some(s) if s > MAX_PAGE_SIZE => Err(ServiceError::Validation(format!(
            "Size cannot exceed {}",
            MAX_PAGE_SIZE
        ))),
        Some(s) => Ok(s),
        None => Ok(DEFAULT_PAGE_SIZE),
    }
}

/// Number of pages needed for `total` items at `size` per page.
pub fn page_count(total: u64, size: u32) -> u32 {
    if size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(size)) as u32
}
