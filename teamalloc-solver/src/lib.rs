mod dp;
pub use dp::*;
mod state;
pub use state::*;
mod traceback;
pub use traceback::*;
mod trial;
pub use trial::*;
