/// Security primitives: credential signing/verification and the opaque
/// password check used by the admin directory.
pub mod password;
pub mod token;

pub use token::{Claims, IssuedCredential, TokenCodec};
