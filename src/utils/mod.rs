pub mod middleware;
pub mod pagination;
pub mod templates;
pub mod validation;
