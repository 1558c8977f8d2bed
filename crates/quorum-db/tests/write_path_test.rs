//! Live-Postgres tests for the transactional write paths.
//!
//! These run only when `DATABASE_URL` is set (see
//! `quorum_db::test_fixtures`); without it every test returns early so the
//! default suite stays hermetic. Each test creates its own uniquely named
//! rows and never depends on a clean database.

use quorum_core::{AskQuestionParams, CreateAnswerParams, EditQuestionParams, Error, SignUpParams};
use quorum_db::test_fixtures::DEFAULT_TEST_DATABASE_URL;
use quorum_db::Database;
use uuid::Uuid;

/// Connect and migrate, or `None` when no test database is configured.
async fn setup() -> Option<Database> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        // QUORUM_DB_TESTS=1 opts in against the default local test database.
        Err(_) if std::env::var("QUORUM_DB_TESTS").is_ok() => {
            DEFAULT_TEST_DATABASE_URL.to_string()
        }
        Err(_) => return None,
    };
    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../../migrations")
        .run(db.pool())
        .await
        .expect("Failed to run migrations");
    Some(db)
}

fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().simple())
}

async fn create_user(db: &Database) -> Uuid {
    let suffix = Uuid::new_v4().simple().to_string();
    let user = db
        .auth
        .sign_up(&SignUpParams {
            username: format!("u{}", &suffix[..12]),
            name: "Test User".to_string(),
            email: format!("{}@example.com", &suffix[..12]),
            password: "Str0ng!pass".to_string(),
        })
        .await
        .expect("Failed to create test user");
    user.id
}

fn ask(tags: &[String]) -> AskQuestionParams {
    AskQuestionParams {
        title: "How does rollback work?".to_string(),
        content: "Asking to be sure.".to_string(),
        tags: tags.to_vec(),
    }
}

/// An uncommitted transaction must roll back its tag-counter increment.
#[tokio::test]
async fn test_tag_counter_increment_rolls_back_with_transaction() {
    let Some(db) = setup().await else { return };
    let author = create_user(&db).await;

    let name = unique("rb")[..12].to_string();
    let created = db
        .questions
        .create(author, &ask(&[name.clone()]))
        .await
        .expect("Failed to create question");
    let tag_id = created.tags[0].id;

    // Increment inside a transaction that is dropped, never committed.
    {
        let mut tx = db.pool().begin().await.expect("begin");
        db.tags
            .upsert_with_increment_tx(&mut tx, &name)
            .await
            .expect("upsert inside transaction");
    }

    let tag = db.tags.get(tag_id).await.expect("get tag").expect("tag row");
    assert_eq!(tag.question_count, 1, "rolled-back increment must not stick");
}

/// Concurrent-style upserts with different casing converge on one tag row,
/// keep the first stored casing, and count both links.
#[tokio::test]
async fn test_upsert_converges_on_case_insensitive_name() {
    let Some(db) = setup().await else { return };
    let author = create_user(&db).await;

    let name = unique("Case")[..12].to_string();
    let first = db
        .questions
        .create(author, &ask(&[name.clone()]))
        .await
        .expect("first create");
    let second = db
        .questions
        .create(author, &ask(&[name.to_lowercase()]))
        .await
        .expect("second create");

    assert_eq!(first.tags[0].id, second.tags[0].id);
    assert_eq!(second.tags[0].name, name, "first casing wins");

    let tag = db
        .tags
        .get(first.tags[0].id)
        .await
        .expect("get tag")
        .expect("tag row");
    assert_eq!(tag.question_count, 2);
}

/// Answer row and parent `answer_count` move together; a missing question
/// leaves no trace.
#[tokio::test]
async fn test_answer_create_is_atomic_with_counter() {
    let Some(db) = setup().await else { return };
    let author = create_user(&db).await;
    let question = db
        .questions
        .create(author, &ask(&[unique("ans")[..12].to_string()]))
        .await
        .expect("create question");
    let question_id = question.question.id;

    db.answers
        .create(
            author,
            &CreateAnswerParams {
                question_id,
                content: "It depends.".to_string(),
            },
        )
        .await
        .expect("create answer");

    let reloaded = db
        .questions
        .get(question_id)
        .await
        .expect("get question")
        .expect("question row");
    assert_eq!(reloaded.question.answer_count, 1);

    let missing = Uuid::new_v4();
    let err = db
        .answers
        .create(
            author,
            &CreateAnswerParams {
                question_id: missing,
                content: "orphan".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::QuestionNotFound(id) if id == missing));
}

/// A non-author edit fails with Forbidden and modifies nothing: not the
/// question, not its tag links, not the tag counters.
#[tokio::test]
async fn test_forbidden_edit_leaves_everything_unmodified() {
    let Some(db) = setup().await else { return };
    let author = create_user(&db).await;
    let intruder = create_user(&db).await;

    let name = unique("own")[..12].to_string();
    let created = db
        .questions
        .create(author, &ask(&[name.clone()]))
        .await
        .expect("create question");
    let question_id = created.question.id;
    let tag_id = created.tags[0].id;

    let err = db
        .questions
        .update(
            intruder,
            &EditQuestionParams {
                question_id,
                title: "hijacked".to_string(),
                content: "hijacked".to_string(),
                tags: vec![unique("hij")[..12].to_string()],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let reloaded = db
        .questions
        .get(question_id)
        .await
        .expect("get question")
        .expect("question row");
    assert_eq!(reloaded.question.title, created.question.title);
    assert_eq!(reloaded.tags.len(), 1);
    assert_eq!(reloaded.tags[0].name, name);

    let tag = db.tags.get(tag_id).await.expect("get tag").expect("tag row");
    assert_eq!(tag.question_count, 1);
}

/// Create returns the author materialized from the same transaction.
#[tokio::test]
async fn test_create_returns_author_summary() {
    let Some(db) = setup().await else { return };
    let author = create_user(&db).await;

    let created = db
        .questions
        .create(author, &ask(&[unique("aut")[..12].to_string()]))
        .await
        .expect("create question");

    let summary = created.author.expect("author summary");
    assert_eq!(summary.id, author);
    assert_eq!(summary.name, "Test User");
}

/// Sign-in must find the credentials account no matter how the email was
/// cased at sign-up or sign-in.
#[tokio::test]
async fn test_verify_credentials_is_case_insensitive() {
    let Some(db) = setup().await else { return };

    let suffix = Uuid::new_v4().simple().to_string();
    let email = format!("MiXeD{}@Example.com", &suffix[..8]);
    db.auth
        .sign_up(&SignUpParams {
            username: format!("m{}", &suffix[..12]),
            name: "Mixed Case".to_string(),
            email: email.clone(),
            password: "Str0ng!pass".to_string(),
        })
        .await
        .expect("sign up");

    let user = db
        .auth
        .verify_credentials(&email.to_lowercase(), "Str0ng!pass")
        .await
        .expect("sign-in with lowercased email");
    assert_eq!(user.email, email);
}
