pub mod check;
pub mod compose;
pub mod info;
pub mod validate;
