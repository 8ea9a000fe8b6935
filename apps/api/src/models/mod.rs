pub mod resume;
pub mod row;
