mod check_access;
mod pages;

pub use check_access::check_access_get;
pub use pages::{admin_home_get, discounts_get};
