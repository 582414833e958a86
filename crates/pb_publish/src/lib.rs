pub mod format;
pub mod publisher;
pub mod transport;

pub use format::{clean_title, pack_post, DEFAULT_POST_BUDGET};
pub use publisher::Publisher;
pub use transport::{XClient, XConfig};

pub mod prelude {
    pub use super::format::pack_post;
    pub use super::publisher::Publisher;
    pub use super::transport::{XClient, XConfig};
    pub use pb_core::{PackedPost, PostTransport, PublishReport, PublishResult, TitleLayout};
}
