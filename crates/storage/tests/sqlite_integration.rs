use exam_core::model::{AnswerSheet, EXAM_TOPICS, QuestionDraft, QuestionId, TestHistory, TestId};
use exam_core::scoring::score_test;
use exam_core::time::fixed_now;
use storage::repository::{HISTORY_KEY, HistoryRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn build_history(test_ids: &[u32]) -> TestHistory {
    let questions: Vec<_> = (1..=3)
        .map(|id| {
            QuestionDraft {
                question_text: format!("Question {id}"),
                code_snippet: None,
                options: vec!["A".into(), "B".into(), "C".into()],
                correct_answer_indices: vec![0, 2],
                explanation: "Two answers are correct.".into(),
                domain: EXAM_TOPICS[4].name.into(),
            }
            .validate()
            .unwrap()
            .assign_id(QuestionId::new(id))
        })
        .collect();

    let mut history = TestHistory::new();
    for test_id in test_ids {
        let mut answers = AnswerSheet::for_questions(&questions);
        answers.toggle(&questions[0], 0).unwrap();
        answers.toggle(&questions[0], 2).unwrap();
        history.record(score_test(TestId::new(*test_id), &questions, &answers, fixed_now()));
    }
    history
}

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_starts_with_empty_history() {
    let repo = connect("memdb_empty").await;
    let history = repo.load_history().await.expect("load");
    assert!(history.is_empty());
}

#[tokio::test]
async fn sqlite_roundtrip_replaces_whole_snapshot() {
    let repo = connect("memdb_roundtrip").await;

    repo.save_history(&build_history(&[1])).await.expect("save");
    let second = build_history(&[1, 2]);
    repo.save_history(&second).await.expect("save again");

    let loaded = repo.load_history().await.expect("load");
    assert_eq!(loaded, second);
    assert_eq!(loaded.latest().unwrap().test_id(), TestId::new(2));
    assert_eq!(loaded.latest().unwrap().score(), 1);

    assert_eq!(repo.keys().await.expect("keys"), vec![HISTORY_KEY.to_owned()]);
}

#[tokio::test]
async fn sqlite_reports_malformed_snapshot() {
    let repo = connect("memdb_malformed").await;
    repo.put_value(HISTORY_KEY, "[{\"testId\": \"oops\"}]")
        .await
        .expect("put raw");

    let err = repo.load_history().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.get_value("missing").await.expect("get"), None);
}
