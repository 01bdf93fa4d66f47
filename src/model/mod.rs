pub mod balance;
pub mod leave;
pub mod role;
