pub mod count;
pub mod vocab;
