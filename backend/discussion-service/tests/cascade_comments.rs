//! Integration tests: code-comment threads and the cascading delete
//!
//! Exercises the comment counter on the external code entity, the
//! reply_count bookkeeping on nested comments, and the deliberate cascade
//! asymmetry: a comment subtree is swept only when deletion starts from a
//! comment with no live parent.

mod common;

use common::{build_services, code_comment_count, insert_code, setup_test_db};
use discussion_service::error::AppError;
use discussion_service::services::votes::VoteState;
use uuid::Uuid;

#[tokio::test]
async fn test_comment_counters_track_thread_changes() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let owner = Uuid::new_v4();
    let commenter = Uuid::new_v4();
    let code_id = insert_code(&pool, owner).await.unwrap();

    let top = svc
        .posts
        .create_code_comment(commenter, code_id, None, "nice code")
        .await
        .unwrap();
    let reply_a = svc
        .posts
        .create_code_comment(owner, code_id, Some(top.id), "thanks")
        .await
        .unwrap();
    svc.posts
        .create_code_comment(commenter, code_id, Some(top.id), "agreed")
        .await
        .unwrap();

    // The code counts the whole tree; only nested replies bump reply_count
    assert_eq!(code_comment_count(&pool, code_id).await.unwrap(), 3);
    let top_reloaded = svc.post_repo.get(top.id).await.unwrap().unwrap();
    assert_eq!(top_reloaded.reply_count, 2);

    // Deleting a nested reply decrements both counters
    svc.posts.delete_code_comment(owner, reply_a.id).await.unwrap();
    assert_eq!(code_comment_count(&pool, code_id).await.unwrap(), 2);
    let top_reloaded = svc.post_repo.get(top.id).await.unwrap().unwrap();
    assert_eq!(top_reloaded.reply_count, 1);
}

#[tokio::test]
async fn test_deleting_thread_root_sweeps_replies() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let owner = Uuid::new_v4();
    let commenter = Uuid::new_v4();
    let voter = Uuid::new_v4();
    let code_id = insert_code(&pool, owner).await.unwrap();

    let top = svc
        .posts
        .create_code_comment(commenter, code_id, None, "root comment")
        .await
        .unwrap();
    let reply = svc
        .posts
        .create_code_comment(owner, code_id, Some(top.id), "a reply")
        .await
        .unwrap();

    svc.votes
        .set_vote(voter, reply.id, VoteState::Cast)
        .await
        .unwrap();

    svc.posts
        .delete_code_comment(commenter, top.id)
        .await
        .unwrap();

    assert!(svc.post_repo.get(top.id).await.unwrap().is_none());
    assert!(svc.post_repo.get(reply.id).await.unwrap().is_none());
    assert_eq!(code_comment_count(&pool, code_id).await.unwrap(), 0);
    assert_eq!(svc.upvotes.count_by_post(reply.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_deleting_nested_reply_never_cascades() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let owner = Uuid::new_v4();
    let code_id = insert_code(&pool, owner).await.unwrap();

    let top = svc
        .posts
        .create_code_comment(owner, code_id, None, "level one")
        .await
        .unwrap();
    let mid = svc
        .posts
        .create_code_comment(owner, code_id, Some(top.id), "level two")
        .await
        .unwrap();
    let deep = svc
        .posts
        .create_code_comment(owner, code_id, Some(mid.id), "level three")
        .await
        .unwrap();

    assert_eq!(code_comment_count(&pool, code_id).await.unwrap(), 3);

    // Deleting the middle comment decrements counters but leaves its own
    // reply in place: a subtree is only swept from a comment with no live
    // parent.
    svc.posts.delete_code_comment(owner, mid.id).await.unwrap();

    assert!(svc.post_repo.get(mid.id).await.unwrap().is_none());
    assert!(svc.post_repo.get(deep.id).await.unwrap().is_some());
    assert_eq!(code_comment_count(&pool, code_id).await.unwrap(), 2);
    let top_reloaded = svc.post_repo.get(top.id).await.unwrap().unwrap();
    assert_eq!(top_reloaded.reply_count, 0);
}

#[tokio::test]
async fn test_create_code_comment_preconditions() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let user = Uuid::new_v4();

    let err = svc
        .posts
        .create_code_comment(user, Uuid::new_v4(), None, "no such code")
        .await;
    assert!(matches!(err, Err(AppError::NotFound(_))));

    let code_id = insert_code(&pool, user).await.unwrap();
    let err = svc
        .posts
        .create_code_comment(user, code_id, Some(Uuid::new_v4()), "no such parent")
        .await;
    assert!(matches!(err, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_answer_delete_decrements_question() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let asker = Uuid::new_v4();
    let answerer = Uuid::new_v4();
    let voter = Uuid::new_v4();

    let question = svc
        .posts
        .create_question(asker, "Counted?", "watch the counter", &[])
        .await
        .unwrap();
    let keep = svc
        .posts
        .create_answer(answerer, question.id, "kept")
        .await
        .unwrap();
    let drop = svc
        .posts
        .create_answer(answerer, question.id, "dropped")
        .await
        .unwrap();

    svc.votes
        .set_vote(voter, drop.id, VoteState::Cast)
        .await
        .unwrap();

    let reloaded = svc.post_repo.get_question(question.id).await.unwrap().unwrap();
    assert_eq!(reloaded.reply_count, 2);

    svc.posts.delete_reply(answerer, drop.id).await.unwrap();

    let reloaded = svc.post_repo.get_question(question.id).await.unwrap().unwrap();
    assert_eq!(reloaded.reply_count, 1);
    assert!(svc.post_repo.get(keep.id).await.unwrap().is_some());
    assert_eq!(svc.upvotes.count_by_post(drop.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_reply_list_orderings_and_scoping() {
    let pool = setup_test_db().await.expect("test db");
    let svc = build_services(pool.clone());

    let asker = Uuid::new_v4();
    let answerer = Uuid::new_v4();

    let question = svc
        .posts
        .create_question(asker, "Ordering", "which answer first?", &[])
        .await
        .unwrap();
    let early = svc
        .posts
        .create_answer(answerer, question.id, "early answer")
        .await
        .unwrap();
    let late = svc
        .posts
        .create_answer(answerer, question.id, "late answer")
        .await
        .unwrap();

    // Separate the creation instants so the time orderings are stable
    sqlx::query("UPDATE posts SET created_at = created_at - INTERVAL '1 hour' WHERE id = $1")
        .bind(early.id)
        .execute(&pool)
        .await
        .unwrap();

    for _ in 0..2 {
        svc.votes
            .set_vote(Uuid::new_v4(), late.id, VoteState::Cast)
            .await
            .unwrap();
    }

    // Most popular puts the voted answer first
    let (count, posts) = svc
        .reply_list
        .list_answers(question.id, 1, 1, 10, None)
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(posts[0].id, late.id);

    // Oldest first / newest first
    let (_, posts) = svc
        .reply_list
        .list_answers(question.id, 2, 1, 10, None)
        .await
        .unwrap();
    assert_eq!(posts[0].id, early.id);
    let (_, posts) = svc
        .reply_list
        .list_answers(question.id, 3, 1, 10, None)
        .await
        .unwrap();
    assert_eq!(posts[0].id, late.id);

    // Pagination windows the result
    let (count, posts) = svc
        .reply_list
        .list_answers(question.id, 2, 2, 1, None)
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, late.id);

    // Unknown filter and bad pagination are rejected
    assert!(matches!(
        svc.reply_list.list_answers(question.id, 7, 1, 10, None).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        svc.reply_list.list_answers(question.id, 1, 0, 10, None).await,
        Err(AppError::Validation(_))
    ));

    // Code-comment view scopes by parent
    let owner = Uuid::new_v4();
    let code_id = insert_code(&pool, owner).await.unwrap();
    let top = svc
        .posts
        .create_code_comment(owner, code_id, None, "top")
        .await
        .unwrap();
    let nested = svc
        .posts
        .create_code_comment(owner, code_id, Some(top.id), "nested")
        .await
        .unwrap();

    let (count, posts) = svc
        .reply_list
        .list_code_comments(code_id, None, 3, 1, 10, None)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(posts[0].id, top.id);

    let (count, posts) = svc
        .reply_list
        .list_code_comments(code_id, Some(top.id), 3, 1, 10, None)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(posts[0].id, nested.id);
}
