pub mod account_service;
pub mod attendance_service;
pub mod audit_service;
pub mod auth_service;
pub mod dashboard_service;
pub mod member_service;
pub mod session_service;
pub mod trainer_service;
pub mod transaction_service;

pub use account_service::*;
pub use attendance_service::*;
pub use audit_service::*;
pub use auth_service::*;
pub use dashboard_service::*;
pub use member_service::*;
pub use session_service::*;
pub use trainer_service::*;
pub use transaction_service::*;
