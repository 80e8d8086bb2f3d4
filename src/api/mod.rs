pub mod pagination;

pub use pagination::{Page, PageQuery, Paginated, PaginationMeta};
