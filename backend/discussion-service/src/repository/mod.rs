pub mod codes;
pub mod followings;
pub mod posts;
pub mod tags;
pub mod upvotes;

pub use codes::CodeRepository;
pub use followings::FollowingRepository;
pub use posts::{PostMatcher, PostRepository, QuestionOrder, QuestionQuery, ReplyOrder};
pub use tags::TagRepository;
pub use upvotes::UpvoteRepository;
