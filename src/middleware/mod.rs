pub mod guards;

pub use guards::AuthUser;
