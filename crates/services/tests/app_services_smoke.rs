mod support;

use std::sync::Arc;

use serde_json::json;
use services::{AppServices, HydrateOutcome, HydrateReport, NoopNotifier};
use storage::repository::Storage;

use support::FakeApi;

#[tokio::test]
async fn sessions_share_storage_but_not_keys() {
    let storage = Storage::in_memory();
    let api = FakeApi::new();
    api.reply(
        "start_assessment",
        json!({"session_id": 7, "questions": [{"id": "q1"}]}),
    );
    api.reply("start_story", json!({"story_id": 3, "guidance": null}));

    let mut services = AppServices::new(&storage, api.clone(), Arc::new(NoopNotifier));
    services.assessment_mut().start().await.unwrap();
    services.story_mut().start("A tale").await.unwrap();

    let mut reopened = AppServices::new(&storage, api.clone(), Arc::new(NoopNotifier));
    let report = reopened.hydrate().await.unwrap();
    assert_eq!(
        report,
        HydrateReport {
            assessment: HydrateOutcome::Restored,
            story: HydrateOutcome::Restored,
        }
    );
    assert_eq!(reopened.assessment().state(), services.assessment().state());
    assert_eq!(reopened.story().state(), services.story().state());

    reopened.story_mut().clear().await.unwrap();
    let mut third = AppServices::new(&storage, api, Arc::new(NoopNotifier));
    let report = third.hydrate().await.unwrap();
    assert_eq!(report.assessment, HydrateOutcome::Restored);
    assert_eq!(report.story, HydrateOutcome::Empty);

    third.clear_all().await.unwrap();
    let report = third.hydrate().await.unwrap();
    assert_eq!(report.assessment, HydrateOutcome::Empty);
    assert_eq!(report.story, HydrateOutcome::Empty);
}

#[tokio::test]
async fn clear_storage_needs_no_backend() {
    let storage = Storage::in_memory();
    let api = FakeApi::new();
    api.reply("start_assessment", json!({"session_id": "s1", "questions": [{"id": 1}]}));
    api.reply("start_story", json!({"story_id": "st1"}));
    let mut services = AppServices::new(&storage, api.clone(), Arc::new(NoopNotifier));
    services.assessment_mut().start().await.unwrap();
    services.story_mut().start("A tale").await.unwrap();
    let calls = api.calls().len();

    AppServices::clear_storage(&storage).await.unwrap();

    assert_eq!(api.calls().len(), calls);
    let mut reopened = AppServices::new(&storage, api, Arc::new(NoopNotifier));
    let report = reopened.hydrate().await.unwrap();
    assert_eq!(report.assessment, HydrateOutcome::Empty);
    assert_eq!(report.story, HydrateOutcome::Empty);
}

#[tokio::test]
async fn clear_sqlite_wipes_both_snapshots() {
    let url = "sqlite:file:services_clear_sqlite?mode=memory&cache=shared";
    let storage = Storage::sqlite(url).await.unwrap();
    let api = FakeApi::new();
    api.reply("start_story", json!({"story_id": 5}));
    let mut services = AppServices::new(&storage, api.clone(), Arc::new(NoopNotifier));
    services.story_mut().start("Kept until cleared").await.unwrap();

    AppServices::clear_sqlite(url).await.unwrap();

    let mut reopened = AppServices::new(&storage, api, Arc::new(NoopNotifier));
    assert_eq!(reopened.hydrate().await.unwrap().story, HydrateOutcome::Empty);
}
