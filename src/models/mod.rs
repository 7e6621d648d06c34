pub mod audit;
pub mod document;
pub mod enums;
pub mod metadata;
pub mod review;
pub mod risk;
pub mod validation;

pub use audit::*;
pub use document::*;
pub use enums::*;
pub use metadata::*;
pub use review::*;
pub use risk::*;
pub use validation::*;
