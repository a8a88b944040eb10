use std::sync::Arc;

use prep_core::model::{Category, ExamConfig, Question, QuestionId, UserId};
use prep_core::time::fixed_clock;
use services::{
    AnswerRecorder, ExamError, ExamLoopService, InMemoryQuestionSource, ReviewService,
    SubmitAnswer,
};
use storage::repository::{ExamResultRepository, InMemoryRepository, StatisticsRepository};

fn question(id: usize, category: Category, correct: usize) -> Question {
    Question::new(
        QuestionId::new(format!("q-{id}")).unwrap(),
        category,
        format!("Question {id}"),
        ["a".into(), "b".into(), "c".into(), "d".into()],
        correct,
        Some("because".into()),
    )
    .unwrap()
}

fn source(size: usize) -> InMemoryQuestionSource {
    let questions = (0..size)
        .map(|i| question(i, Category::ALL[i % Category::COUNT], i % 4))
        .collect();
    InMemoryQuestionSource::new(questions)
}

fn user() -> UserId {
    UserId::new("u-flow").unwrap()
}

#[tokio::test]
async fn full_exam_flow_scores_and_persists() {
    let repo = InMemoryRepository::new();
    let loop_svc = ExamLoopService::new(fixed_clock(), Arc::new(repo.clone()));
    let config = ExamConfig::new(10, 600, 6).unwrap();

    let mut session = loop_svc
        .start_exam(user(), &source(40), config)
        .await
        .unwrap();
    assert_eq!(session.questions().len(), 10);

    // Answer everything correctly except the last two, which stay blank.
    for position in 0..8 {
        let correct = session.questions()[position].correct_option();
        session.select_answer(position, correct).unwrap();
    }

    let outcome = loop_svc.finish_exam(&mut session).await.unwrap();
    assert_eq!(outcome.result.score(), 8);
    assert_eq!(outcome.result.total_questions(), 10);
    assert!(outcome.result.is_passed());

    let rows = loop_svc.list_results(&user(), 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].result, outcome.result);

    // Finishing again changes nothing.
    let again = loop_svc.finish_exam(&mut session).await.unwrap();
    assert_eq!(again, outcome);
    assert_eq!(repo.list_results(&user(), 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn timeout_forces_finish_with_partial_answers() {
    let loop_svc = ExamLoopService::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
    let config = ExamConfig::new(5, 300, 3).unwrap();

    let mut session = loop_svc
        .start_exam(user(), &source(20), config)
        .await
        .unwrap();
    let correct = session.questions()[0].correct_option();
    session.select_answer(0, correct).unwrap();

    // The countdown runs out mid-exam.
    let result = session.tick(300, fixed_clock().now()).unwrap().unwrap();
    assert_eq!(result.score(), 1);
    assert_eq!(result.time_used_secs(), 300);
    assert!(!result.is_passed());

    // The forced result is what gets persisted.
    let outcome = loop_svc.finish_exam(&mut session).await.unwrap();
    assert_eq!(outcome.result, result);
}

#[tokio::test]
async fn mistakes_feed_the_review_exam() {
    let repo = InMemoryRepository::new();
    let recorder = AnswerRecorder::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let pool = source(12);

    // Miss four questions, answer two correctly.
    let outcomes = [false, false, true, false, true, false];
    for (i, expect_correct) in outcomes.into_iter().enumerate() {
        let q = question(i, Category::ALL[i % Category::COUNT], i % 4);
        let chosen = if expect_correct {
            q.correct_option()
        } else {
            (q.correct_option() + 1) % 4
        };
        recorder
            .submit_answer(SubmitAnswer {
                user_id: user().as_str().into(),
                category: q.category().as_str().into(),
                question_id: q.id().as_str().into(),
                chosen_option: chosen,
                correct_option: q.correct_option(),
                time_spent_secs: 25,
            })
            .await
            .unwrap();
    }

    let review = ReviewService::new(Arc::new(repo.clone()));
    let queue = review.due_for_review(&user(), 50).await.unwrap();
    assert_eq!(queue.len(), 4);

    let loop_svc = ExamLoopService::new(fixed_clock(), Arc::new(repo.clone()));
    let config = ExamConfig::new(10, 600, 2).unwrap();
    let session = loop_svc
        .start_review_exam(user(), &review, &pool, config, 50)
        .await
        .unwrap();

    // The sheet holds exactly the distinct missed questions.
    assert_eq!(session.questions().len(), 4);
    let queued: Vec<_> = queue.question_ids();
    for q in session.questions() {
        assert!(queued.contains(q.id()));
    }
}

#[tokio::test]
async fn review_exam_requires_mistakes() {
    let repo = InMemoryRepository::new();
    let review = ReviewService::new(Arc::new(repo.clone()));
    let loop_svc = ExamLoopService::new(fixed_clock(), Arc::new(repo));

    let err = loop_svc
        .start_review_exam(
            user(),
            &review,
            &source(10),
            ExamConfig::default_mock_exam(),
            50,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ExamError::EmptyPool));
}

#[tokio::test]
async fn recorded_answers_accumulate_into_statistics() {
    let repo = InMemoryRepository::new();
    let recorder = AnswerRecorder::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );

    for i in 0..5 {
        recorder
            .submit_answer(SubmitAnswer {
                user_id: user().as_str().into(),
                category: "zoning-restrictions".into(),
                question_id: format!("q-{i}"),
                // Even submissions hit, odd ones miss: 3 correct out of 5.
                chosen_option: 0,
                correct_option: usize::from(i % 2 != 0),
                time_spent_secs: 30,
            })
            .await
            .unwrap();
    }

    let stats = repo.get_statistics(&user()).await.unwrap().unwrap();
    assert_eq!(stats.total_questions(), 5);
    assert_eq!(stats.correct_answers(), 3);
    assert_eq!(stats.total_study_secs(), 150);
    assert_eq!(stats.study_days(), 1);
    assert_eq!(stats.current_streak(), 1);
    let tally = stats.category(Category::ZoningRestrictions);
    assert_eq!((tally.total(), tally.correct()), (5, 3));
}
