pub mod pagination;
pub mod query;
pub mod response;

pub use pagination::{PaginatedResponse, PaginationMeta};
pub use query::{deserialize_optional_bool_from_string, PaginationQuery, SortOrder};
pub use response::ApiResponse;
