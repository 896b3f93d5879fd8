pub mod account;
pub mod attendance;
pub mod audit;
pub mod common;
pub mod dashboard;
pub mod member;
pub mod pagination;
pub mod session;
pub mod trainer;
pub mod transaction;

pub use account::*;
pub use attendance::*;
pub use audit::*;
pub use common::*;
pub use dashboard::*;
pub use member::*;
pub use pagination::*;
pub use session::*;
pub use trainer::*;
pub use transaction::*;
