pub mod preprocessing;
pub mod detection;
pub mod crop;
pub mod alpha;

pub use preprocessing::*;
pub use detection::*;
pub use crop::*;
pub use alpha::*;
