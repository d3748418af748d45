pub mod assets;
pub mod records;
