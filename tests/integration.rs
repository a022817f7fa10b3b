use std::path::Path;

use refqa_core::controller::{ANSWER_FAILED_RESPONSE, INVALID_QUESTION_RESPONSE};
use refqa_core::{AnswerSet, Config, GroundTruthSet, Pipeline, QuestionSet, score};
use refqa_index::IndexBackend;
use refqa_llm::mock::MockProvider;

const FAQ: &str = r#"{
    "0": [{"question": "信用卡遺失如何掛失？", "answers": ["請立即撥打24小時客服專線辦理掛失"]}],
    "1": [{"question": "外幣匯款手續費如何計算？", "answers": ["每筆新臺幣100元", "郵電費另計"]}],
    "2": [{"question": "網路銀行密碼忘記怎麼辦？", "answers": ["臨櫃或線上重設密碼"]}]
}"#;

const QUESTIONS: &str = r#"{"questions": [
    {"qid": 1, "source": [0, 1, 2], "query": "我的信用卡不見了要怎麼掛失？", "category": "faq"},
    {"qid": 2, "source": [0, 1, 2], "query": "匯款到國外要多少手續費？", "category": "faq"},
    {"qid": 3, "source": [0, 1, 2], "query": "忘記網銀密碼", "category": "faq"},
    {"qid": 4, "source": [0, 1, 2], "query": "?", "category": "faq"},
    {"qid": 5, "source": [10, 11], "query": "保單理賠需要哪些文件？", "category": "insurance"}
]}"#;

const GROUND_TRUTH: &str = r#"{"ground_truths": [
    {"qid": 1, "retrieve": 0, "category": "faq"},
    {"qid": 2, "retrieve": 1, "category": "faq"},
    {"qid": 3, "retrieve": 0, "category": "faq"},
    {"qid": 4, "retrieve": 2, "category": "faq"},
    {"qid": 5, "retrieve": 10, "category": "insurance"}
]}"#;

/// Embeds by topic keyword so retrieval is deterministic.
fn keyword_mock() -> MockProvider {
    MockProvider::with_responses(Vec::new()).with_embed_rule(|text| {
        let topics = ["掛失", "手續費", "密碼"];
        topics
            .iter()
            .map(|t| if text.contains(t) { 1.0 } else { 0.0 })
            .collect()
    })
}

fn config(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.data_dir = root.join("formatted_data");
    config.paths.index_dir = root.join("index");
    config.categories = vec!["faq".into()];
    config
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[tokio::test]
async fn faq_pipeline_builds_answers_and_scores() {
    let root = tempfile::tempdir().unwrap();
    let reference = root.path().join("reference");
    write(&reference.join("faq/pid_map_content.json"), FAQ);
    write(&root.path().join("questions.json"), QUESTIONS);
    write(&root.path().join("ground_truths.json"), GROUND_TRUTH);

    let config = config(root.path());
    let mock = keyword_mock();
    let pipeline = Pipeline::new(
        &config,
        mock.clone(),
        IndexBackend::local(&config.paths.index_dir),
    );

    let reports = pipeline
        .initialization(&reference)
        .ensure_indexes(&config.categories)
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].created);
    assert_eq!(reports[0].documents, 3);
    assert!(root.path().join("index/faq_index.json").is_file());

    let questions = QuestionSet::read(&root.path().join("questions.json"))
        .await
        .unwrap();
    let answers = pipeline.questions().answer_all(&questions).await;

    let output = root.path().join("out/pred_retrieve.json");
    answers.write(&output).await.unwrap();
    let raw = std::fs::read_to_string(&output).unwrap();
    assert!(raw.contains("\"answers\""));
    assert!(raw.contains("我的信用卡不見了要怎麼掛失？"));

    let reloaded = AnswerSet::read(&output).await.unwrap();
    let retrieved: Vec<_> = reloaded
        .answers
        .iter()
        .map(|a| (a.qid, a.retrieve))
        .collect();
    assert_eq!(
        retrieved,
        [
            (1, Some(0)),
            (2, Some(1)),
            (3, Some(2)),
            (4, None),
            (5, None)
        ]
    );
    assert_eq!(reloaded.answers[0].response, "mock response");
    assert_eq!(reloaded.answers[3].response, INVALID_QUESTION_RESPONSE);
    assert_eq!(reloaded.answers[4].response, ANSWER_FAILED_RESPONSE);

    let truths = GroundTruthSet::read(&root.path().join("ground_truths.json"))
        .await
        .unwrap();
    let report = score(&reloaded.answers, &truths.ground_truths);
    assert_eq!(report.total, 5);
    assert_eq!(report.matching, 2);
    assert!((report.ratio - 0.4).abs() < f64::EPSILON);

    // three answered questions reached the chat model, none for indexing
    assert_eq!(mock.calls().len(), 3);
}

#[tokio::test]
async fn second_run_reuses_saved_index() {
    let root = tempfile::tempdir().unwrap();
    let reference = root.path().join("reference");
    write(&reference.join("faq/faq.json"), FAQ);
    let config = config(root.path());

    let first = Pipeline::new(
        &config,
        keyword_mock(),
        IndexBackend::local(&config.paths.index_dir),
    );
    first
        .initialization(&reference)
        .ensure_indexes(&config.categories)
        .await
        .unwrap();

    // the source files are gone; only the saved corpus and index remain
    std::fs::remove_dir_all(&reference).unwrap();

    let second = Pipeline::new(
        &config,
        keyword_mock(),
        IndexBackend::local(&config.paths.index_dir),
    );
    let reports = second
        .initialization(&reference)
        .ensure_indexes(&config.categories)
        .await
        .unwrap();
    assert!(!reports[0].created);

    let answer = second
        .questions()
        .handle_question("匯款手續費怎麼算？", "faq")
        .await
        .unwrap();
    assert_eq!(answer.sources.first().map(String::as_str), Some("1"));
}

#[tokio::test]
async fn pdf_category_is_summarized_before_indexing() {
    let root = tempfile::tempdir().unwrap();
    let reference = root.path().join("reference");
    write(&reference.join("finance/12.pdf"), "not read");
    let mut config = config(root.path());
    config.categories = vec!["finance".into()];
    // extracted text from an earlier run is reused
    write(
        &config.paths.data_dir.join("finance_all_text.json"),
        r#"{"12": "本公司第三季合併營收與淨利說明"}"#,
    );

    let mock = MockProvider::with_responses(vec!["第三季營收摘要".into()]);
    let pipeline = Pipeline::new(
        &config,
        mock.clone(),
        IndexBackend::local(&config.paths.index_dir),
    );
    let reports = pipeline
        .initialization(&reference)
        .ensure_indexes(&config.categories)
        .await
        .unwrap();
    assert_eq!(reports[0].documents, 1);

    let summaries =
        std::fs::read_to_string(config.paths.data_dir.join("finance_summarized_documents.json"))
            .unwrap();
    assert!(summaries.contains("第三季營收摘要"));
    assert_eq!(mock.calls().len(), 1);
}
