mod breakpoint;
pub use breakpoint::*;

mod design;
pub use design::*;

mod expr;
pub use expr::*;

mod stmt;
pub use stmt::*;
