//! End-to-end tests of the consumer pipeline through the public API

use eventline::consumer::{ConsumerState, Pipeline};
use eventline::nlp::{tweet, DocumentVectorizer, RawDocument};
use eventline::queue::DocumentQueue;
use eventline::tdt::DetectorConfig;
use eventline::timeline::{Development, Timeline, TimelineConfig};
use eventline::vsm::FreezePolicy;
use eventline::{EventlineConfig, QueueError};

/// Quiet chatter for five minutes, then a goal
fn match_stream() -> Vec<RawDocument> {
    let mut documents = Vec::new();
    for window in 0..5 {
        for i in 0..3 {
            documents.push((window * 60 + 10 + i, "Referee whistle, the match goes on"));
        }
    }
    for i in 0..5 {
        documents.push((310 + i, "GOAL!!! France scores #WorldCup"));
    }
    documents.push((330, "referee whistle match"));

    documents
        .into_iter()
        .enumerate()
        .map(|(id, (ts, text))| RawDocument::new(id.to_string(), text, ts))
        .collect()
}

async fn run(config: &EventlineConfig, documents: Vec<RawDocument>) -> Vec<Development> {
    let queue = DocumentQueue::unbounded();
    let mut pipeline = Pipeline::new(
        config,
        queue.clone(),
        Box::new(DocumentVectorizer::default()),
    )
    .unwrap();
    for document in documents {
        queue.enqueue(document).unwrap();
    }
    queue.close();

    pipeline.run().await.unwrap();
    assert_eq!(pipeline.state(), ConsumerState::Stopped);
    pipeline.take_developments()
}

fn with_detector(name: &str) -> EventlineConfig {
    EventlineConfig {
        detector: DetectorConfig::from_name(name).unwrap(),
        ..EventlineConfig::default()
    }
}

#[tokio::test]
async fn test_eld_reports_goal() {
    let developments = run(&with_detector("eld"), match_stream()).await;
    assert_eq!(developments.len(), 1);

    let development = &developments[0];
    assert_eq!(development.timestamp, 360);
    let terms = development.term_names();
    assert!(terms.contains(&"goal"));
    assert!(terms.contains(&"france"));
    assert!(!terms.contains(&"referee"));
    assert!(development
        .documents
        .iter()
        .all(|d| d.text.contains("GOAL")));
}

#[tokio::test]
async fn test_cataldi_reports_goal() {
    let developments = run(&with_detector("cataldi"), match_stream()).await;
    assert_eq!(developments.len(), 1);
    assert!(developments[0].term_names().contains(&"goal"));
}

#[tokio::test]
async fn test_zhao_reports_goal() {
    let developments = run(&with_detector("zhao"), match_stream()).await;
    assert_eq!(developments.len(), 1);
    assert_eq!(developments[0].timestamp, 360);
    assert!(developments[0].term_names().contains(&"goal"));
}

#[tokio::test]
async fn test_independent_pipelines_agree() {
    let config = with_detector("eld");
    let (a, b) = tokio::join!(run(&config, match_stream()), run(&config, match_stream()));
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_temporal_freezing_pipeline() {
    let mut config = with_detector("eld");
    config.clustering.freeze = FreezePolicy::Temporal {
        period_secs: 120,
        recency_decay: 0.5,
    };
    let developments = run(&config, match_stream()).await;
    assert_eq!(developments.len(), 1);
}

#[tokio::test]
async fn test_developments_serialize() {
    let developments = run(&with_detector("eld"), match_stream()).await;
    let json = serde_json::to_string(&developments[0]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["schema_version"], 1);
    assert_eq!(value["timestamp"], 360);
    assert!(value["terms"][0]["term"].is_string());

    let back: Development = serde_json::from_str(&json).unwrap();
    assert_eq!(back.timestamp, developments[0].timestamp);
}

#[tokio::test]
async fn test_developments_feed_timeline() {
    let developments = run(&with_detector("eld"), match_stream()).await;
    let mut timeline = Timeline::new(TimelineConfig::default()).unwrap();
    for development in developments {
        timeline.add(development);
    }
    assert_eq!(timeline.len(), 1);

    let summary = timeline.summarize().unwrap();
    assert_eq!(summary[0].0, 360);
    assert!(!summary[0].1.is_empty());
    assert!(summary[0].1.len() <= 3);
}

#[tokio::test]
async fn test_tweets_from_json() {
    let lines = [
        r#"{"id_str": "1", "text": "referee whistle match", "timestamp_ms": "10000"}"#,
        r#"{"id_str": "2", "text": "RT @fan: kickoff", "retweeted_status": {"text": "kickoff delayed by rain"}, "timestamp_ms": "20000"}"#,
        r#"{"id_str": "3", "lang": "en"}"#,
    ];
    let documents: Vec<RawDocument> = lines
        .iter()
        .filter_map(|l| tweet::to_document(&serde_json::from_str(l).unwrap()))
        .collect();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[1].text, "kickoff delayed by rain");

    let developments = run(&EventlineConfig::default(), documents).await;
    assert!(developments.is_empty());
}

#[test]
fn test_bounded_queue_refuses_overflow() {
    let config = EventlineConfig {
        queue: eventline::config::QueueConfig { capacity: Some(1) },
        ..EventlineConfig::default()
    };
    let queue = config.queue.build::<RawDocument>().unwrap();
    queue.enqueue(RawDocument::new("1", "goal", 0)).unwrap();
    assert_eq!(
        queue.enqueue(RawDocument::new("2", "goal", 0)),
        Err(QueueError::Full { capacity: 1 })
    );
    assert_eq!(queue.len(), 1);
}
