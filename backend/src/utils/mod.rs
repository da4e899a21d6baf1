pub mod jwt;
pub mod password;
pub mod time;

pub use jwt::*;
pub use password::*;
pub use time::*;
