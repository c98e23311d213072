pub mod clock;
pub mod jwt;
pub mod password;
pub mod validate;

pub use clock::Clock;
pub use validate::{ValidatedJson, ValidatedQuery};
