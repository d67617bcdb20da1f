pub mod platform;
pub mod profile;
pub mod review;

pub use platform::*;
pub use profile::*;
pub use review::*;
