pub mod contact;
pub mod jwt;
pub mod membership;
pub mod or_number;
pub mod password;

pub use contact::*;
pub use jwt::*;
pub use membership::*;
pub use or_number::*;
pub use password::*;
