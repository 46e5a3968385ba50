pub mod app_state;
pub mod query_tabs;
