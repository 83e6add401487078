pub mod compare;
pub mod exec;
pub mod session;
pub mod testcase;

pub use compare::*;
pub use exec::*;
pub use session::*;
pub use testcase::*;
