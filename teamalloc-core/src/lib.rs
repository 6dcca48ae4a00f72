mod allocation;
pub use allocation::*;
mod generate;
pub use generate::*;
mod instance;
pub use instance::*;
mod params;
pub use params::*;
