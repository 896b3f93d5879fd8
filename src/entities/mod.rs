pub mod accounts;
pub mod attendance;
pub mod audit_trail;
pub mod members;
pub mod membership_periods;
pub mod sessions;
pub mod trainers;
pub mod transactions;

pub use accounts as account_entity;
pub use attendance as attendance_entity;
pub use audit_trail as audit_entity;
pub use members as member_entity;
pub use membership_periods as period_entity;
pub use sessions as session_entity;
pub use trainers as trainer_entity;
pub use transactions as transaction_entity;

pub use accounts::Role;
pub use attendance::AttendanceStatus;
pub use members::MembershipType;
pub use sessions::SessionStatus;
pub use transactions::PaymentMethod;
