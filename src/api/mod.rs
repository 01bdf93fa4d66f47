pub mod balance;
pub mod dashboard;
pub mod leave;
