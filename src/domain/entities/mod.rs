pub mod edit;
pub mod table;
