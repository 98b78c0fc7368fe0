pub mod form;
pub mod menu;
pub mod worker;

pub use form::run_form;
pub use menu::run_menu;
