pub mod reimbursement;
pub mod user;

pub use reimbursement::ReimbRepository;
pub use user::UserRepository;
