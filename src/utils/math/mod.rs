pub mod checked;
pub mod matrix;
pub mod vector;
