pub mod admins;
pub mod session;
