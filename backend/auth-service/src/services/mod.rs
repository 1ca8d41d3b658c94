pub mod directory;
pub mod login;

pub use directory::{
    CredentialDirectory, DirectoryError, HttpCredentialDirectory, StaticCredentialDirectory,
};
pub use login::LoginService;
