use std::path::{Path, PathBuf};

use anyhow::Context;
use refqa_core::{AccuracyReport, AnswerSet, GroundTruthSet, Pipeline, QuestionSet, score as score_answers};
use refqa_llm::AnyProvider;

/// Scored automatically after `run` when no ground truth is passed and it exists.
const DEFAULT_GROUND_TRUTH: &str = "data/dataset/preliminary/ground_truths_example.json";

pub(crate) fn default_ground_truth() -> Option<PathBuf> {
    let path = PathBuf::from(DEFAULT_GROUND_TRUTH);
    path.is_file().then_some(path)
}

pub(crate) async fn build(
    pipeline: &Pipeline<AnyProvider>,
    source_path: &Path,
    categories: &[String],
) -> anyhow::Result<()> {
    let reports = pipeline
        .initialization(source_path)
        .ensure_indexes(categories)
        .await
        .context("failed to build indexes")?;
    for report in &reports {
        if report.created {
            tracing::info!(category = %report.category, documents = report.documents, "index built");
        }
    }
    println!("All indexes are ready.");
    Ok(())
}

pub(crate) async fn answer(
    pipeline: &Pipeline<AnyProvider>,
    question_path: &Path,
    output_path: &Path,
) -> anyhow::Result<()> {
    let questions = QuestionSet::read(question_path)
        .await
        .with_context(|| format!("failed to read questions from {}", question_path.display()))?;
    tracing::info!(questions = questions.questions.len(), "answering question set");

    let answers = pipeline.questions().answer_all(&questions).await;
    answers
        .write(output_path)
        .await
        .with_context(|| format!("failed to write answers to {}", output_path.display()))?;
    println!("Answers written to {}", output_path.display());
    Ok(())
}

pub(crate) async fn ask(
    pipeline: &Pipeline<AnyProvider>,
    category: &str,
    question: &str,
) -> anyhow::Result<()> {
    let answer = pipeline
        .questions()
        .handle_question(question, category)
        .await
        .context("failed to answer question")?;
    println!("{}", answer.response);
    if !answer.sources.is_empty() {
        println!("sources: {}", answer.sources.join(", "));
    }
    Ok(())
}

pub(crate) async fn score(
    output_path: &Path,
    ground_truth_path: &Path,
) -> anyhow::Result<AccuracyReport> {
    let answers = AnswerSet::read(output_path)
        .await
        .with_context(|| format!("failed to read answers from {}", output_path.display()))?;
    let truths = GroundTruthSet::read(ground_truth_path).await.with_context(|| {
        format!(
            "failed to read ground truth from {}",
            ground_truth_path.display()
        )
    })?;

    let report = score_answers(&answers.answers, &truths.ground_truths);
    println!("{report}");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scores_legacy_answer_files() {
        let dir = tempfile::tempdir().unwrap();
        let answers = dir.path().join("model_output.json");
        let truths = dir.path().join("ground_truths.json");
        std::fs::write(
            &answers,
            r#"{"ansewers": [
                {"qid": 1, "retrieve": 392, "query": "q1", "category": "insurance", "response": "r"},
                {"qid": 2, "retrieve": 5, "query": "q2", "category": "finance", "response": "r"}
            ]}"#,
        )
        .unwrap();
        std::fs::write(
            &truths,
            r#"{"ground_truths": [
                {"qid": 1, "retrieve": 392, "category": "insurance"},
                {"qid": 2, "retrieve": 6, "category": "finance"}
            ]}"#,
        )
        .unwrap();

        let report = score(&answers, &truths).await.unwrap();
        assert_eq!((report.total, report.matching), (2, 1));
        assert!((report.ratio - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn missing_answer_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = score(&dir.path().join("none.json"), &dir.path().join("gt.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to read answers"));
    }
}
