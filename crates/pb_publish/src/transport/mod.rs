pub mod x;

pub use x::{XClient, XConfig, X_API_BASE_URL};
