pub mod comment_dao;
pub mod forum_dao;
pub mod group_dao;
pub mod media_dao;
pub mod poll_dao;
pub mod reaction_dao;
pub mod user_dao;

pub use comment_dao::CommentDao;
pub use forum_dao::ForumDao;
pub use group_dao::GroupDao;
pub use media_dao::MediaDao;
pub use poll_dao::PollDao;
pub use reaction_dao::{ReactionDao, ReactionKind, ReactionSubject};
pub use user_dao::UserDao;
