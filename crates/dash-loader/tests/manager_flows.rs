//! Load, cache and reload flows of the per-generation managers

use dash_loader::{
    apply_json_edit, DashboardPageManager, FetchOutcome, FolderInfo, KeyValueStore, LoadError,
    LoadOptions, LoadPhase, MismatchSignal as _, ProvisioningPreview, ProvisioningTarget,
    ReloadParams, RepositoryInfo, Route, StoreError, STASHED_DASHBOARD_KEY,
};
use dash_schema::resource::{ANNO_MANAGED_BY, ANNO_MANAGER_ID, ANNO_SOURCE_PATH};
use dash_schema::{DashboardDto, DashboardMeta, RawDocument, SchemaVersion};
use dash_test_utils::{
    minimal_v2_spec, v1_dashboard, v1_document, v2_document, v2_document_in_folder, StoreCall,
    TestEnv,
};
use dash_transform::scene_to_document;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn ptr_eq<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

#[tokio::test(start_paused = true)]
async fn back_to_back_loads_share_one_fetch() {
    let env = TestEnv::at("/d/d1");
    env.store.insert(v1_document("d1", 1));
    let manager = env.v1_manager();

    manager.load_dashboard(&LoadOptions::uid("d1")).await.unwrap();
    let first = manager.state();
    manager.load_dashboard(&LoadOptions::uid("d1")).await.unwrap();
    let second = manager.state();

    assert_eq!(env.store.dashboard_fetches("d1"), 1);
    assert_eq!(second.phase, LoadPhase::Loaded);
    assert!(ptr_eq(&first.dashboard, &second.dashboard));
}

#[tokio::test(start_paused = true)]
async fn expired_document_is_refetched_and_new_version_rebuilt() {
    let env = TestEnv::at("/d/d1");
    env.store.insert(v1_document("d1", 1));
    let manager = env.v1_manager();

    manager.load_dashboard(&LoadOptions::uid("d1")).await.unwrap();
    let first = manager.state().dashboard;

    tokio::time::advance(Duration::from_secs(2)).await;
    manager.load_dashboard(&LoadOptions::uid("d1")).await.unwrap();
    assert_eq!(env.store.dashboard_fetches("d1"), 2);
    assert!(ptr_eq(&first, &manager.state().dashboard));

    env.store.insert(v1_document("d1", 2));
    tokio::time::advance(Duration::from_secs(2)).await;
    manager.load_dashboard(&LoadOptions::uid("d1")).await.unwrap();
    let third = manager.state().dashboard;
    assert!(!ptr_eq(&first, &third));
    assert_eq!(third.map(|s| s.version()), Some(2));
}

#[tokio::test]
async fn reload_with_unchanged_version_keeps_the_scene() {
    let env = TestEnv::at("/d/d1");
    let created = |version| {
        RawDocument::V1(DashboardDto::new(
            v1_dashboard("d1", version),
            DashboardMeta {
                created: Some("t0".into()),
                ..DashboardMeta::default()
            },
        ))
    };
    env.store.insert(created(3));
    let manager = env.v1_manager();
    manager.load_dashboard(&LoadOptions::uid("d1")).await.unwrap();
    let shown = manager.state().dashboard.unwrap();
    let mut changes = shown.subscribe();
    changes.mark_unchanged();
    let mut published = manager.subscribe();
    published.mark_unchanged();

    let params = ReloadParams {
        time_range: Some(("now-1h".into(), "now".into())),
        ..ReloadParams::default()
    };
    manager.reload_dashboard(&params).await.unwrap();

    let after = manager.state();
    assert_eq!(after.phase, LoadPhase::Loaded);
    assert!(Arc::ptr_eq(&shown, after.dashboard.as_ref().unwrap()));
    assert!(!changes.has_changed().unwrap());
    assert!(!published.has_changed().unwrap());
    assert_eq!(env.store.dashboard_fetches("d1"), 2);
    assert!(env.store.calls().contains(&StoreCall::Dashboard {
        version: SchemaVersion::V1,
        uid: "d1".into(),
        params: vec![("from".into(), "now-1h".into()), ("to".into(), "now".into())],
    }));

    env.store.insert(created(4));
    manager.reload_dashboard(&params).await.unwrap();
    let reloaded = manager.state().dashboard.unwrap();
    assert!(!Arc::ptr_eq(&shown, &reloaded));
    assert_eq!(reloaded.version(), 4);
}

#[tokio::test]
async fn failed_reload_keeps_the_shown_dashboard() {
    let env = TestEnv::new();
    env.store.insert(v1_document("d1", 1));
    let manager = env.v1_manager();
    manager.load_dashboard(&LoadOptions::uid("d1")).await.unwrap();
    let shown = manager.state().dashboard.unwrap();

    env.store.fail("d1", StoreError::http(500, "boom"));
    let params = ReloadParams {
        version: Some(2),
        ..ReloadParams::default()
    };
    manager.reload_dashboard(&params).await.unwrap();

    let state = manager.state();
    assert_eq!(state.phase, LoadPhase::Error);
    assert!(!state.is_loading);
    assert_eq!(state.load_error.as_ref().map(|e| e.status), Some(500));
    assert!(Arc::ptr_eq(&shown, state.dashboard.as_ref().unwrap()));

    env.store.clear_failure("d1");
    manager.reload_dashboard(&params).await.unwrap();
    let state = manager.state();
    assert_eq!(state.phase, LoadPhase::Loaded);
    assert!(state.load_error.is_none());
    assert!(Arc::ptr_eq(&shown, state.dashboard.as_ref().unwrap()));
}

#[tokio::test]
async fn reload_without_a_dashboard_is_a_no_op() {
    let env = TestEnv::new();
    let manager = env.v1_manager();
    manager.reload_dashboard(&ReloadParams::default()).await.unwrap();
    assert!(env.store.calls().is_empty());
    assert_eq!(manager.state().phase, LoadPhase::Idle);
}

#[tokio::test]
async fn new_dashboards_are_never_cached() {
    let env = TestEnv::new();
    let manager = env.v1_manager();

    manager.load_dashboard(&LoadOptions::new_dashboard()).await.unwrap();
    let first = manager.state().dashboard;
    manager.load_dashboard(&LoadOptions::new_dashboard()).await.unwrap();
    let second = manager.state().dashboard;

    assert_eq!(env.store.count(|c| matches!(c, StoreCall::NewTemplate(SchemaVersion::V1))), 2);
    assert!(!ptr_eq(&first, &second));
    let scene = second.unwrap();
    assert!(scene.read(|s| s.meta.is_new));
    assert_eq!(scene.read(|s| s.title.clone()), "New dashboard");
}

#[tokio::test]
async fn stashed_dashboard_replaces_the_template_once() {
    let env = TestEnv::new();
    env.kv.set(STASHED_DASHBOARD_KEY, json!({"title": "imported", "panels": []}).to_string());
    let manager = env.v1_manager();

    manager.load_dashboard(&LoadOptions::new_dashboard()).await.unwrap();
    let scene = manager.state().dashboard.unwrap();
    assert_eq!(scene.read(|s| s.title.clone()), "imported");
    assert!(env.kv.get(STASHED_DASHBOARD_KEY).is_none());
    assert_eq!(env.store.count(|c| matches!(c, StoreCall::NewTemplate(_))), 0);

    manager.load_dashboard(&LoadOptions::new_dashboard()).await.unwrap();
    assert_eq!(env.store.count(|c| matches!(c, StoreCall::NewTemplate(_))), 1);
}

#[tokio::test]
async fn redirect_navigates_without_error() {
    let env = TestEnv::at("/d/old");
    env.store.redirect("old", "/d/new-uid/renamed");
    let manager = env.v1_manager();

    manager.load_dashboard(&LoadOptions::uid("old")).await.unwrap();

    let state = manager.state();
    assert_eq!(state.phase, LoadPhase::Loaded);
    assert!(state.dashboard.is_none());
    assert!(state.load_error.is_none());
    assert_eq!(env.location.replacements(), vec!["/d/new-uid/renamed".to_string()]);
}

#[tokio::test]
async fn cancelled_fetch_publishes_nothing() {
    let env = TestEnv::new();
    env.store.fail("d1", StoreError::Cancelled);
    let manager = env.v1_manager();

    manager.load_dashboard(&LoadOptions::uid("d1")).await.unwrap();

    let state = manager.state();
    assert_eq!(state.phase, LoadPhase::Loaded);
    assert!(state.dashboard.is_none());
    assert!(state.load_error.is_none());
}

#[tokio::test]
async fn store_failures_become_published_errors() {
    let env = TestEnv::new();
    env.store.fail("down", StoreError::http(503, "backend unavailable"));
    let manager = env.v1_manager();

    manager.load_dashboard(&LoadOptions::uid("missing")).await.unwrap();
    let state = manager.state();
    assert_eq!(state.phase, LoadPhase::Error);
    assert_eq!(state.load_error.as_ref().map(|e| e.status), Some(404));
    assert!(state.dashboard.is_none());

    manager.load_dashboard(&LoadOptions::uid("down")).await.unwrap();
    let error = manager.state().load_error.unwrap();
    assert_eq!(error.status, 503);
    assert!(error.message.contains("backend unavailable"));

    env.store.clear_failure("down");
    env.store.insert(v1_document("down", 1));
    manager.load_dashboard(&LoadOptions::uid("down")).await.unwrap();
    assert_eq!(manager.state().phase, LoadPhase::Loaded);
}

#[tokio::test]
async fn empty_uid_is_rejected() {
    let env = TestEnv::new();
    let manager = env.v2_manager();
    manager.load_dashboard(&LoadOptions::uid("")).await.unwrap();
    assert_eq!(manager.state().load_error.map(|e| e.status), Some(400));
    assert!(env.store.calls().is_empty());
}

#[tokio::test]
async fn wrong_generation_is_reported_as_mismatch() {
    let env = TestEnv::new();
    env.store.insert(v2_document("d2", 1, minimal_v2_spec("Resource")));
    let manager = env.v1_manager();

    let err = manager.load_dashboard(&LoadOptions::uid("d2")).await.unwrap_err();
    assert!(matches!(err, LoadError::VersionMismatch(_)));
    assert_eq!(err.version_mismatch().map(|m| m.stored_version), Some(SchemaVersion::V2));
    assert_eq!(manager.state().phase, LoadPhase::Error);
}

#[tokio::test]
async fn canonical_url_keeps_query_string() {
    let env = TestEnv::at("/d/d1?orgId=1&from=now-1h");
    env.store.insert(RawDocument::V1(DashboardDto::new(
        v1_dashboard("d1", 1),
        DashboardMeta {
            url: Some("/d/d1/service-overview".into()),
            ..DashboardMeta::default()
        },
    )));
    let manager = env.v1_manager();

    manager.load_dashboard(&LoadOptions::uid("d1")).await.unwrap();
    assert_eq!(
        env.location.replacements(),
        vec!["/d/d1/service-overview?orgId=1&from=now-1h".to_string()]
    );
}

#[tokio::test]
async fn folder_title_is_attached() {
    let env = TestEnv::new();
    env.store.insert(v2_document_in_folder("d5", 1, "f1"));
    env.store.insert(v2_document_in_folder("d6", 1, "gone"));
    env.store.insert_folder(FolderInfo {
        uid: "f1".into(),
        title: "Team".into(),
        url: Some("/dashboards/f/f1".into()),
    });
    let manager = env.v2_manager();

    manager.load_dashboard(&LoadOptions::uid("d5")).await.unwrap();
    let scene = manager.state().dashboard.unwrap();
    assert_eq!(scene.read(|s| s.meta.folder_title.clone()), Some("Team".into()));
    assert_eq!(scene.read(|s| s.meta.folder_url.clone()), Some("/dashboards/f/f1".into()));

    manager.load_dashboard(&LoadOptions::uid("d6")).await.unwrap();
    let state = manager.state();
    assert_eq!(state.phase, LoadPhase::Loaded);
    assert_eq!(state.dashboard.unwrap().read(|s| s.meta.folder_title.clone()), None);
}

#[tokio::test]
async fn home_bypasses_caches() {
    let env = TestEnv::new();
    env.store.set_home(Ok(FetchOutcome::Document(v1_document("home", 1))));
    let manager = env.v1_manager();

    manager.load_dashboard(&LoadOptions::home()).await.unwrap();
    let first = manager.state().dashboard;
    manager.load_dashboard(&LoadOptions::home()).await.unwrap();
    let second = manager.state().dashboard;

    assert_eq!(env.store.count(|c| *c == StoreCall::Home), 2);
    assert!(!ptr_eq(&first, &second));
    assert!(second.unwrap().read(|s| s.meta.is_home));
}

#[tokio::test]
async fn home_redirect() {
    let env = TestEnv::at("/");
    env.store.set_home(Ok(FetchOutcome::Redirect {
        uri: "/d/landing".into(),
    }));
    let manager = env.v1_manager();

    manager.load_dashboard(&LoadOptions::home()).await.unwrap();
    assert!(manager.state().dashboard.is_none());
    assert_eq!(env.location.replacements(), vec!["/d/landing".to_string()]);
}

#[tokio::test]
async fn public_dashboards_use_the_access_token() {
    let env = TestEnv::new();
    env.store.insert_public("tok-1", v1_document("pub", 1));
    let manager = env.v1_manager();
    let options = LoadOptions::default().with_route(Route::Public {
        access_token: "tok-1".into(),
    });

    manager.load_dashboard(&options).await.unwrap();
    let first = manager.state().dashboard;
    manager.load_dashboard(&options).await.unwrap();

    assert_eq!(env.store.count(|c| matches!(c, StoreCall::Public(_))), 1);
    assert!(ptr_eq(&first, &manager.state().dashboard));
    assert_eq!(env.store.dashboard_fetches("pub"), 0);
}

#[tokio::test]
async fn embedded_route_flags_the_scene() {
    let env = TestEnv::new();
    env.store.insert(v1_document("emb", 1));
    let manager = env.v1_manager();

    manager
        .load_dashboard(&LoadOptions::uid("emb").with_route(Route::Embedded))
        .await
        .unwrap();
    assert!(manager.state().dashboard.unwrap().read(|s| s.meta.is_embedded));
}

#[tokio::test]
async fn snapshot_variables_are_frozen() {
    let env = TestEnv::new();
    env.store.insert_snapshot("snap-1", v1_document("s1", 1));
    let manager = env.v1_manager();

    manager.load_snapshot("snap-1").await.unwrap();
    let scene = manager.state().dashboard.unwrap();
    assert!(scene.read(|s| s.variables.iter().all(|v| v.is_read_only())));
    assert_eq!(scene.read(|s| s.variables.len()), 3);

    manager.load_snapshot("unknown").await.unwrap();
    assert_eq!(manager.state().load_error.map(|e| e.status), Some(404));
}

fn preview() -> ProvisioningPreview {
    ProvisioningPreview {
        path: "dash.json".into(),
        git_ref: None,
        hash: Some("abc123".into()),
        repository: RepositoryInfo {
            name: "repo-1".into(),
            kind: "github".into(),
            title: "Dashboards".into(),
        },
        dry_run: json!({
            "apiVersion": "dashboard.grafana.app/v2alpha1",
            "kind": "Dashboard",
            "metadata": {"name": "prov-1", "generation": 1},
            "spec": minimal_v2_spec("Provisioned"),
        }),
    }
}

#[tokio::test]
async fn provisioning_preview_carries_repository_annotations() {
    let env = TestEnv::new();
    env.store.insert_preview("repo-1", "dash.json", preview());
    let manager = env.v2_manager();
    let options = LoadOptions::default().with_route(Route::Provisioning(ProvisioningTarget {
        repo: "repo-1".into(),
        path: "dash.json".into(),
        git_ref: None,
    }));

    manager.load_dashboard(&options).await.unwrap();
    let scene = manager.state().dashboard.unwrap();
    assert_eq!(scene.uid(), "prov-1");
    assert_eq!(scene.read(|s| s.title.clone()), "Provisioned");
    let annotations = scene.read(|s| s.meta.k8s.clone()).unwrap().annotations;
    let expected: BTreeMap<&str, &str> = [
        (ANNO_MANAGED_BY, "repo"),
        (ANNO_MANAGER_ID, "repo-1"),
        (ANNO_SOURCE_PATH, "dash.json"),
    ]
    .into_iter()
    .collect();
    for (key, value) in expected {
        assert_eq!(annotations.get(key).map(String::as_str), Some(value));
    }

    manager.load_dashboard(&options).await.unwrap();
    assert_eq!(env.store.count(|c| matches!(c, StoreCall::Preview { .. })), 1);
}

#[tokio::test(start_paused = true)]
async fn superseded_load_is_discarded() {
    let env = TestEnv::new();
    env.store.insert(v1_document("slow", 1));
    env.store.insert(v1_document("fast", 1));
    env.store.delay("slow", Duration::from_millis(200));
    let manager = env.v1_manager();

    let slow_opts = LoadOptions::uid("slow");
    let fast_opts = LoadOptions::uid("fast");
    let (slow, fast) = tokio::join!(
        manager.load_dashboard(&slow_opts),
        manager.load_dashboard(&fast_opts),
    );
    slow.unwrap();
    fast.unwrap();

    let state = manager.state();
    assert_eq!(state.phase, LoadPhase::Loaded);
    assert_eq!(state.dashboard_uid().as_deref(), Some("fast"));
}

#[tokio::test]
async fn clear_state_returns_to_idle() {
    let env = TestEnv::new();
    env.store.insert(v1_document("d1", 1));
    let manager = env.v1_manager();
    manager.load_dashboard(&LoadOptions::uid("d1")).await.unwrap();

    manager.clear_state();
    let state = manager.state();
    assert_eq!(state.phase, LoadPhase::Idle);
    assert!(state.dashboard.is_none());
    assert!(manager.get_scene_from_cache("d1").await.is_some());

    manager.clear_scene_cache();
    manager.clear_dashboard_cache();
    assert!(manager.get_dashboard_from_cache("d1").is_none());
}

#[tokio::test]
async fn edits_apply_to_the_shown_scene() {
    let env = TestEnv::new();
    env.store.insert(v2_document("e1", 1, minimal_v2_spec("Before")));
    let manager = env.v2_manager();
    manager.load_dashboard(&LoadOptions::uid("e1")).await.unwrap();
    let scene = manager.state().dashboard.unwrap();

    let outcome = apply_json_edit(&scene, &minimal_v2_spec("After").to_string());
    assert!(outcome.success, "{outcome:?}");
    assert!(Arc::ptr_eq(&scene, manager.state().dashboard.as_ref().unwrap()));
    assert!(scene.read(|s| s.is_dirty));
    assert_eq!(scene.uid(), "e1");
    assert_eq!(scene_to_document(&scene, false).unwrap()["title"], json!("After"));

    let outcome = apply_json_edit(&scene, r#"{"title": "no time"}"#);
    assert!(!outcome.success);
    assert_eq!(scene.read(|s| s.title.clone()), "After");
}
