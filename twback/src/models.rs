pub mod post;
pub mod profile;

pub use post::{Entries, Post, PostCounts, Video};
pub use profile::{Profile, ProfileCounts};
