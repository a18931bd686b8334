pub mod folder;
pub mod generate;
