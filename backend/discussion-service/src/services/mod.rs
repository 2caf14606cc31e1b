pub mod posts;
pub mod question_list;
pub mod reply_list;
pub mod tags;
pub mod votes;

pub use posts::PostService;
pub use question_list::{QuestionFilter, QuestionListParams, QuestionListService};
pub use reply_list::{ReplyFilter, ReplyListService};
pub use tags::TagResolver;
pub use votes::VoteService;
