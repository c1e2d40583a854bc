pub mod booking;
pub mod employee;
pub mod macros;
pub mod session;
pub mod settings;
pub mod time;

pub use booking::*;
pub use employee::*;
pub use session::*;
pub use settings::*;
