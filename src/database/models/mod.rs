pub mod comment;
pub mod forum;
pub mod group;
pub mod media;
pub mod poll;
pub mod user;

pub use comment::Comment;
pub use forum::Forum;
pub use group::{Group, GroupMember};
pub use media::Media;
pub use poll::{Poll, PollOption};
pub use user::User;
