//! Batch export behavior against a fake board API.

mod common;

use common::{configured, item, pipeline, store_with, Call, FakeBoardApi};
use std::sync::Arc;
use trello_export::error::ExportError;
use trello_export::item::ExportResult;
use trello_export::store::{ExportConfig, SettingsStore};

#[tokio::test]
async fn test_already_exported_item_makes_no_remote_calls() {
    let api = Arc::new(FakeBoardApi::new());
    let store = store_with(configured(), &["https://twitter.com/a/status/1"]);

    let summary = pipeline(&api, &store)
        .export(vec![item("old", "https://twitter.com/a/status/1")])
        .await
        .unwrap();

    assert!(api.calls().is_empty());
    assert_eq!(summary.skipped_count(), 1);
    assert!(summary.all_skipped());
    assert_eq!(summary.succeeded(), 0);
}

#[tokio::test]
async fn test_fresh_batch_exports_all_and_grows_history() {
    let api = Arc::new(FakeBoardApi::new());
    let store = store_with(configured(), &["https://twitter.com/z/status/0"]);
    let items = vec![
        item("one", "https://twitter.com/a/status/1"),
        item("two", "https://twitter.com/a/status/2"),
        item("three", "https://twitter.com/a/status/3"),
    ];

    let summary = pipeline(&api, &store).export(items).await.unwrap();

    assert_eq!(summary.succeeded(), 3);
    assert_eq!(summary.failed(), 0);
    assert_eq!(summary.skipped_count(), 0);
    assert_eq!(api.card_calls(), vec!["one", "two", "three"]);

    let history = store.history().unwrap();
    assert_eq!(history.len(), 4);
    for n in 1..=3 {
        assert!(history.contains(&format!("https://twitter.com/a/status/{}", n)));
    }
}

#[tokio::test]
async fn test_history_written_before_next_card() {
    let store = store_with(configured(), &[]);
    let api = Arc::new(FakeBoardApi::new().failing_card("two").watching(&store));
    let items = vec![
        item("one", "https://twitter.com/a/status/1"),
        item("two", "https://twitter.com/a/status/2"),
        item("three", "https://twitter.com/a/status/3"),
    ];

    pipeline(&api, &store).export(items).await.unwrap();

    let seen = api.history_at_create();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].is_empty());
    // "one" is already recorded when "two" is attempted.
    assert_eq!(seen[1].iter().collect::<Vec<_>>(), ["https://twitter.com/a/status/1"]);
    // The failed "two" is never recorded.
    assert_eq!(seen[2], seen[1]);
}

#[tokio::test]
async fn test_failed_card_does_not_stop_the_batch() {
    let api = Arc::new(FakeBoardApi::new().failing_card("two"));
    let store = store_with(configured(), &[]);
    let items = vec![
        item("one", "https://twitter.com/a/status/1"),
        item("two", "https://twitter.com/a/status/2"),
        item("three", "https://twitter.com/a/status/3"),
    ];

    let summary = pipeline(&api, &store).export(items).await.unwrap();

    let results: Vec<bool> = summary.outcomes.iter().map(|o| o.is_success()).collect();
    assert_eq!(results, vec![true, false, true]);
    match &summary.outcomes[1].result {
        ExportResult::Failure { message } => {
            assert!(message.contains("400"));
            assert!(message.contains("invalid value for idList"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(summary.outcomes[1].item.text, "two");

    // Failed item is not recorded, so a later run retries it.
    let history = store.history().unwrap();
    assert!(!history.contains("https://twitter.com/a/status/2"));
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_incomplete_config_fails_fast() {
    let api = Arc::new(FakeBoardApi::new());
    let config = ExportConfig {
        list_id: String::new(),
        ..configured()
    };
    let store = store_with(config, &[]);

    let err = pipeline(&api, &store)
        .export(vec![item("one", "u1")])
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Config));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_cover_is_first_non_profile_image() {
    let api = Arc::new(FakeBoardApi::new());
    let store = store_with(configured(), &[]);
    let mut post = item("pics", "https://twitter.com/a/status/9");
    post.images = vec![
        "p/profile_images/a.jpg".to_string(),
        "x/photo1.jpg".to_string(),
        "y/photo2.jpg".to_string(),
    ];

    let summary = pipeline(&api, &store).export(vec![post]).await.unwrap();
    assert_eq!(summary.succeeded(), 1);

    let calls = api.calls();
    let attached: Vec<&str> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Attach { url, .. } => Some(url.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(attached, vec!["p/profile_images/a.jpg", "x/photo1.jpg", "y/photo2.jpg"]);

    let covers: Vec<&Call> = calls
        .iter()
        .filter(|c| matches!(c, Call::SetCover { .. }))
        .collect();
    assert_eq!(covers.len(), 1);
    // card-1 is the card, att-2..att-4 the attachments in order.
    assert_eq!(
        covers[0],
        &Call::SetCover {
            card_id: "card-1".to_string(),
            attachment_id: "att-3".to_string(),
        }
    );
}

#[tokio::test]
async fn test_attachment_failure_keeps_item_successful() {
    let api = Arc::new(FakeBoardApi::new().failing_attachment("x/photo1.jpg"));
    let store = store_with(configured(), &[]);
    let mut post = item("pics", "https://twitter.com/a/status/9");
    post.images = vec!["x/photo1.jpg".to_string(), "y/photo2.jpg".to_string()];

    let summary = pipeline(&api, &store).export(vec![post]).await.unwrap();

    assert_eq!(summary.succeeded(), 1);
    // The next usable attachment becomes the cover instead.
    let calls = api.calls();
    let cover = calls
        .iter()
        .find(|c| matches!(c, Call::SetCover { .. }))
        .unwrap();
    assert_eq!(
        cover,
        &Call::SetCover {
            card_id: "card-1".to_string(),
            attachment_id: "att-2".to_string(),
        }
    );
    assert!(store.history().unwrap().contains("https://twitter.com/a/status/9"));
}

#[tokio::test]
async fn test_attachments_named_and_in_order() {
    let api = Arc::new(FakeBoardApi::new());
    let store = store_with(configured(), &[]);
    let mut post = item("pics", "");
    post.images = vec![
        "https://pbs.twimg.com/media/b.png?format=png".to_string(),
        "https://pbs.twimg.com/media/a.jpg".to_string(),
    ];

    pipeline(&api, &store).export(vec![post]).await.unwrap();

    let names: Vec<String> = api
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Attach { name, .. } => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["b.png", "a.jpg"]);
}

#[tokio::test]
async fn test_items_without_url_are_never_deduped() {
    let api = Arc::new(FakeBoardApi::new());
    let store = store_with(configured(), &[]);

    let p = pipeline(&api, &store);
    p.export(vec![item("anon", "")]).await.unwrap();
    let summary = p.export(vec![item("anon", "")]).await.unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(api.card_calls().len(), 2);
    assert!(store.history().unwrap().is_empty());
}

#[tokio::test]
async fn test_mixed_batch_skips_and_exports_in_order() {
    let api = Arc::new(FakeBoardApi::new());
    let store = store_with(configured(), &["u2"]);
    let items = vec![item("one", "u1"), item("two", "u2"), item("three", "u3"), item("again", "u1")];

    let summary = pipeline(&api, &store).export(items).await.unwrap();

    assert_eq!(api.card_calls(), vec!["one", "three"]);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.skipped_count(), 2);
    assert!(api
        .calls()
        .iter()
        .all(|c| !matches!(c, Call::CreateCard { list_id, .. } if list_id != "l1")));
}

#[tokio::test(start_paused = true)]
async fn test_pacing_delays_between_cards() {
    use trello_export::config::ExportPacingConfig;
    use trello_export::pipeline::ExportPipeline;

    let api = Arc::new(FakeBoardApi::new());
    let store = store_with(configured(), &[]);
    let pacing = ExportPacingConfig {
        card_delay_ms: 100,
        attachment_delay_ms: 50,
    };
    let mut post = item("pics", "u3");
    post.images = vec!["x/a.jpg".to_string(), "x/b.jpg".to_string()];
    let pipeline = ExportPipeline::new(api.clone(), store.clone(), pacing);

    let start = tokio::time::Instant::now();
    pipeline
        .export(vec![item("one", "u1"), item("two", "u2"), post])
        .await
        .unwrap();

    // Two gaps between three cards plus one gap between two attachments.
    let elapsed = start.elapsed();
    assert!(elapsed >= std::time::Duration::from_millis(250));
    assert!(elapsed < std::time::Duration::from_millis(300));
}
