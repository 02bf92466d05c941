mod hash;
mod info;
mod validate;

pub use hash::{hash_pack, HashPackArgs};
pub use info::{info_pack, InfoPackArgs};
pub use validate::{validate_pack, ValidatePackArgs};
