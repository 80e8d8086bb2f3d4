pub mod auth_service;
pub mod comment_service;
pub mod forum_service;
pub mod group_service;
pub mod media_service;
pub mod poll_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use comment_service::CommentService;
pub use forum_service::ForumService;
pub use group_service::GroupService;
pub use media_service::MediaService;
pub use poll_service::PollService;
pub use user_service::UserService;
