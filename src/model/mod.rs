pub mod reimbursement;
pub mod role;
pub mod user;
