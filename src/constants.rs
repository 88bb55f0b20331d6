// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:8080";
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Category hierarchy: root (0) -> level 1 -> level 2
pub const MAX_CATEGORY_DEPTH: u32 = 2;

// Pagination defaults and limits
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const FLAT_LIST_PAGE_SIZE: u32 = 100;
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 20, 50, 100];

// Validation limits
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_USERNAME_LENGTH: usize = 4;
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Category error codes carried in the `errorCode` field of error bodies
pub const CATEGORY_DEPTH_EXCEEDED: &str = "CATEGORY_DEPTH_EXCEEDED";
pub const CATEGORY_HAS_CHILDREN: &str = "CATEGORY_HAS_CHILDREN";
pub const CATEGORY_NAME_CONFLICT: &str = "CATEGORY_NAME_CONFLICT";
pub const CATEGORY_NOT_FOUND: &str = "CATEGORY_NOT_FOUND";
pub const CATEGORY_VALIDATION_ERROR: &str = "CATEGORY_VALIDATION_ERROR";
pub const CATEGORY_CIRCULAR_RELATIONSHIP: &str = "CATEGORY_CIRCULAR_RELATIONSHIP";
pub const CATEGORY_OWNERSHIP_ERROR: &str = "CATEGORY_OWNERSHIP_ERROR";
pub const UNAUTHORIZED_CODE: &str = "UNAUTHORIZED";
pub const INTERNAL_ERROR_CODE: &str = "INTERNAL_ERROR";

// Error messages
pub const ERR_DATABASE_OPERATION: &str = "Database operation failed";
pub const ERR_UNAUTHORIZED: &str = "Not logged in";
pub const ERR_INVALID_TOKEN: &str = "Invalid or expired token";
pub const ERR_UNEXPECTED: &str = "An unexpected error occurred";
pub const ERR_NO_CATEGORIES_DATA: &str = "No categories data received";
