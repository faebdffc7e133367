pub mod appointments;
pub mod auth;
pub mod customers;
pub mod finances;
pub mod health;
pub mod invoices;
pub mod materials;
pub mod notes;
pub mod proxy;
pub mod quotes;
pub mod time_tracking;
