//! Integration tests: question/answer lifecycle
//!
//! Covers the counter and uniqueness invariants end-to-end against a real
//! database:
//! - reply_count tracks live answers across create/delete
//! - vote_count tracks live upvote rows, including idempotent repeats and
//!   concurrent voters
//! - the single-accepted-answer invariant and its recomputed parent flag
//! - cascading question deletion and its idempotent re-invocation
//! - question list filters, search and annotation

mod common;

use common::{build_services, count_followings, insert_following, setup_test_db};
use discussion_service::error::AppError;
use discussion_service::services::votes::VoteState;
use discussion_service::services::QuestionListParams;
use futures::future::try_join_all;
use uuid::Uuid;

fn list_params(filter: i32, viewer: Option<Uuid>) -> QuestionListParams {
    QuestionListParams {
        filter,
        page: 1,
        page_size: 20,
        search_query: None,
        profile_user_id: None,
        viewer_user_id: viewer,
    }
}

#[tokio::test]
async fn test_question_answer_vote_accept_delete_flow() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let asker = Uuid::new_v4();
    let answerer = Uuid::new_v4();
    let voter = Uuid::new_v4();

    // Ask: tags resolve to two ids, counters start at zero
    let question = svc
        .posts
        .create_question(asker, "Why Go?", "Is Go worth learning?", &[
            "go".to_string(),
            "perf".to_string(),
        ])
        .await
        .expect("create question");
    assert_eq!(question.tag_ids.len(), 2);
    assert_eq!(question.reply_count, 0);
    assert_eq!(question.vote_count, 0);

    // Answer bumps the question's reply_count
    let answer = svc
        .posts
        .create_answer(answerer, question.id, "Yes, for servers.")
        .await
        .expect("create answer");
    let reloaded = svc.post_repo.get_question(question.id).await.unwrap().unwrap();
    assert_eq!(reloaded.reply_count, 1);

    // Repeated identical vote is a no-op on the counter
    svc.votes
        .set_vote(voter, answer.id, VoteState::Cast)
        .await
        .expect("vote");
    svc.votes
        .set_vote(voter, answer.id, VoteState::Cast)
        .await
        .expect("vote again");
    let voted = svc.post_repo.get(answer.id).await.unwrap().unwrap();
    assert_eq!(voted.vote_count, 1);
    assert_eq!(svc.upvotes.count_by_post(answer.id).await.unwrap(), 1);

    // Accepting a second answer hands the flag over
    svc.posts.set_accepted(answer.id, true).await.expect("accept");
    let second = svc
        .posts
        .create_answer(answerer, question.id, "Also for tooling.")
        .await
        .expect("second answer");
    svc.posts
        .set_accepted(second.id, true)
        .await
        .expect("accept second");

    let first = svc.post_repo.get(answer.id).await.unwrap().unwrap();
    let second_reloaded = svc.post_repo.get(second.id).await.unwrap().unwrap();
    let question_reloaded = svc.post_repo.get_question(question.id).await.unwrap().unwrap();
    assert!(!first.is_accepted);
    assert!(second_reloaded.is_accepted);
    assert!(question_reloaded.is_accepted);

    // Un-accepting a post that is not the accepted one must leave the
    // parent flag alone (it is recomputed, not copied)
    svc.posts
        .set_accepted(answer.id, false)
        .await
        .expect("unaccept non-accepted");
    let question_reloaded = svc.post_repo.get_question(question.id).await.unwrap().unwrap();
    assert!(question_reloaded.is_accepted);

    // Un-accepting the accepted answer clears the parent flag
    svc.posts
        .set_accepted(second.id, false)
        .await
        .expect("unaccept accepted");
    let question_reloaded = svc.post_repo.get_question(question.id).await.unwrap().unwrap();
    assert!(!question_reloaded.is_accepted);

    // Delete the question: answers, upvotes and followings all go
    insert_following(&pool, voter, question.id).await.unwrap();
    svc.posts
        .delete_question(asker, question.id)
        .await
        .expect("delete question");

    assert!(svc.post_repo.get(question.id).await.unwrap().is_none());
    assert!(svc.post_repo.get(answer.id).await.unwrap().is_none());
    assert!(svc.post_repo.get(second.id).await.unwrap().is_none());
    assert_eq!(svc.upvotes.count_by_post(answer.id).await.unwrap(), 0);
    assert_eq!(count_followings(&pool, question.id).await.unwrap(), 0);

    let (count, items) = svc
        .question_list
        .list(&list_params(1, None))
        .await
        .expect("list");
    assert_eq!(count, 0);
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_concurrent_votes_from_distinct_users() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let asker = Uuid::new_v4();
    let question = svc
        .posts
        .create_question(asker, "Counting", "How many voters?", &["meta".to_string()])
        .await
        .expect("create question");

    let voters: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
    try_join_all(
        voters
            .iter()
            .map(|voter| svc.votes.set_vote(*voter, question.id, VoteState::Cast)),
    )
    .await
    .expect("concurrent votes");

    let reloaded = svc.post_repo.get(question.id).await.unwrap().unwrap();
    assert_eq!(reloaded.vote_count, 8);
    assert_eq!(svc.upvotes.count_by_post(question.id).await.unwrap(), 8);

    // Half the voters withdraw, concurrently
    try_join_all(
        voters[..4]
            .iter()
            .map(|voter| svc.votes.set_vote(*voter, question.id, VoteState::Absent)),
    )
    .await
    .expect("concurrent unvotes");

    let reloaded = svc.post_repo.get(question.id).await.unwrap().unwrap();
    assert_eq!(reloaded.vote_count, 4);
    assert_eq!(svc.upvotes.count_by_post(question.id).await.unwrap(), 4);
}

#[tokio::test]
async fn test_vote_on_missing_post_is_not_found() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let result = svc
        .votes
        .set_vote(Uuid::new_v4(), Uuid::new_v4(), VoteState::Cast)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_concurrent_tag_resolution_creates_one_row() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let names = vec!["rustlang".to_string()];
    let ids = try_join_all((0..8).map(|_| svc.tag_resolver.resolve(&names)))
        .await
        .expect("concurrent resolution");

    let first = ids[0][0];
    assert!(ids.iter().all(|batch| batch == &vec![first]));

    let row_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE name = 'rustlang'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row_count, 1);
}

#[tokio::test]
async fn test_question_list_filters_and_search() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let old = svc
        .posts
        .create_question(alice, "Why Go?", "old and answered", &["go".to_string()])
        .await
        .unwrap();
    let fresh = svc
        .posts
        .create_question(bob, "Borrow checker woes", "fresh and open", &[
            "rust".to_string(),
        ])
        .await
        .unwrap();

    // Age the first question out of the hot window
    sqlx::query("UPDATE posts SET created_at = NOW() - INTERVAL '2 days' WHERE id = $1")
        .bind(old.id)
        .execute(&pool)
        .await
        .unwrap();

    svc.posts
        .create_answer(bob, old.id, "answered")
        .await
        .unwrap();

    // Most recent: both, newest first
    let (count, items) = svc.question_list.list(&list_params(1, None)).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(items[0].id, fresh.id);

    // Unanswered: only the fresh one
    let (count, items) = svc.question_list.list(&list_params(2, None)).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(items[0].id, fresh.id);

    // My questions requires a profile id
    let err = svc.question_list.list(&list_params(3, None)).await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    let mut params = list_params(3, None);
    params.profile_user_id = Some(alice);
    let (count, items) = svc.question_list.list(&params).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(items[0].id, old.id);

    // My replies: questions bob answered
    let mut params = list_params(4, None);
    params.profile_user_id = Some(bob);
    let (count, items) = svc.question_list.list(&params).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(items[0].id, old.id);

    // Hot today: only the fresh question qualifies
    let (count, items) = svc.question_list.list(&list_params(5, None)).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(items[0].id, fresh.id);

    // Unknown filter is rejected
    let err = svc.question_list.list(&list_params(9, None)).await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    // Search by title prefix (case-insensitive)
    let mut params = list_params(1, None);
    params.search_query = Some("why".to_string());
    let (count, items) = svc.question_list.list(&params).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(items[0].id, old.id);

    // Search by exact tag name
    let mut params = list_params(1, None);
    params.search_query = Some("rust".to_string());
    let (count, items) = svc.question_list.list(&params).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(items[0].id, fresh.id);

    // Viewer annotation reflects held upvotes
    svc.votes
        .set_vote(alice, fresh.id, VoteState::Cast)
        .await
        .unwrap();
    let (_, items) = svc
        .question_list
        .list(&list_params(1, Some(alice)))
        .await
        .unwrap();
    let fresh_item = items.iter().find(|i| i.id == fresh.id).unwrap();
    let old_item = items.iter().find(|i| i.id == old.id).unwrap();
    assert!(fresh_item.is_upvoted);
    assert!(!old_item.is_upvoted);
}

#[tokio::test]
async fn test_delete_question_is_idempotent() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let asker = Uuid::new_v4();
    let other_asker = Uuid::new_v4();

    let doomed = svc
        .posts
        .create_question(asker, "Doomed", "going away", &[])
        .await
        .unwrap();
    let survivor = svc
        .posts
        .create_question(other_asker, "Survivor", "staying put", &[])
        .await
        .unwrap();
    svc.posts
        .create_answer(other_asker, survivor.id, "still here")
        .await
        .unwrap();
    svc.posts
        .create_answer(other_asker, doomed.id, "gone soon")
        .await
        .unwrap();

    svc.posts.delete_question(asker, doomed.id).await.unwrap();

    // Second invocation finds nothing to match: no error, and the
    // survivor's counters are untouched
    let result = svc.posts.delete_question(asker, doomed.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    use discussion_service::repository::PostMatcher;
    svc.posts
        .delete_and_cleanup(PostMatcher::Id(doomed.id))
        .await
        .expect("re-running the cleanup matcher is a no-op");

    let survivor_reloaded = svc.post_repo.get_question(survivor.id).await.unwrap().unwrap();
    assert_eq!(survivor_reloaded.reply_count, 1);
}

#[tokio::test]
async fn test_edit_permissions() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let author = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let question = svc
        .posts
        .create_question(author, "Original", "original body", &["go".to_string()])
        .await
        .unwrap();

    let err = svc
        .posts
        .edit_question(stranger, question.id, "Hijacked", "nope", &[])
        .await;
    assert!(matches!(err, Err(AppError::Unauthorized(_))));

    let edited = svc
        .posts
        .edit_question(author, question.id, "Updated", "new body", &[
            "rust".to_string(),
        ])
        .await
        .unwrap();
    assert_eq!(edited.title.as_deref(), Some("Updated"));
    assert_eq!(edited.tag_ids.len(), 1);

    let answer = svc
        .posts
        .create_answer(stranger, question.id, "an answer")
        .await
        .unwrap();
    let err = svc.posts.edit_reply(author, answer.id, "not yours").await;
    assert!(matches!(err, Err(AppError::Unauthorized(_))));
}
