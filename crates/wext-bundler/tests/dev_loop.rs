//! Incremental rebuilds after a classified change.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use wext_bundler::{
    ChangeKind, NoopHooks, RebuildOutcome, StaticBuilder, detect_dev_changes, pipeline,
};
use wext_config::{Command, InlineConfig, ResolvedConfig, UserConfig};

fn write(root: &Path, path: &str, contents: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "package.json", r#"{ "name": "dev-ext", "version": "0.1.0" }"#);
    write(root, "wext.toml", "browser = \"chrome\"\n");
    write(root, "entrypoints/background.ts", "export default defineBackground(() => {});\n");
    write(root, "entrypoints/popup.html", "<html><body>v1</body></html>");
    write(
        root,
        "entrypoints/overlay.content.ts",
        "export default defineContentScript({ matches: ['<all_urls>'], main() {} });\n",
    );
    dir
}

fn config(root: &Path) -> Arc<ResolvedConfig> {
    Arc::new(
        ResolvedConfig::resolve(
            root,
            UserConfig::default(),
            Some(root.join("wext.toml")),
            Command::Serve,
            InlineConfig::default(),
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn content_script_edit_rebuilds_only_that_script() {
    let dir = project();
    let config = config(dir.path());
    let builder = Arc::new(StaticBuilder::new(&config));
    let (summary, coordinator) = pipeline::build(config.clone(), builder, Arc::new(NoopHooks))
        .await
        .unwrap();

    let overlay = config.entrypoints_dir.join("overlay.content.ts");
    write(
        dir.path(),
        "entrypoints/overlay.content.ts",
        "export default defineContentScript({ matches: ['<all_urls>'], main() { console.log(2) } });\n",
    );

    let change = detect_dev_changes(&config, &[overlay], &summary.output);
    assert_eq!(change.kind(), ChangeKind::ContentScriptReload);
    assert_eq!(change.rebuild_groups().len(), 1);

    let previous_ids = summary.output.step_ids();
    let RebuildOutcome::Rebuilt(result) = coordinator
        .apply(&summary.entrypoints, change)
        .await
        .unwrap()
    else {
        panic!("expected a rebuild");
    };

    let ids = result.output.step_ids();
    assert_eq!(ids.len(), previous_ids.len());
    let kept = ids.iter().filter(|id| previous_ids.contains(id)).count();
    assert_eq!(kept, previous_ids.len() - 1);
    assert_eq!(result.output.manifest, summary.output.manifest);

    let rebuilt = fs::read_to_string(config.out_dir.join("content-scripts/overlay.js")).unwrap();
    assert!(rebuilt.contains("console.log(2)"));
}

#[tokio::test]
async fn html_edit_is_a_page_reload() {
    let dir = project();
    let config = config(dir.path());
    let builder = Arc::new(StaticBuilder::new(&config));
    let (summary, coordinator) = pipeline::build(config.clone(), builder, Arc::new(NoopHooks))
        .await
        .unwrap();

    write(dir.path(), "entrypoints/popup.html", "<html><body>v2</body></html>");
    let change = detect_dev_changes(
        &config,
        &[config.entrypoints_dir.join("popup.html")],
        &summary.output,
    );
    assert_eq!(change.kind(), ChangeKind::HtmlReload);

    coordinator.apply(&summary.entrypoints, change).await.unwrap();
    let popup = fs::read_to_string(config.out_dir.join("popup.html")).unwrap();
    assert!(popup.contains("v2"));
}

#[tokio::test]
async fn config_edit_requests_restart_without_building() {
    let dir = project();
    let config = config(dir.path());
    let builder = Arc::new(StaticBuilder::new(&config));
    let (summary, coordinator) = pipeline::build(config.clone(), builder, Arc::new(NoopHooks))
        .await
        .unwrap();

    let change = detect_dev_changes(
        &config,
        &[
            config.entrypoints_dir.join("popup.html"),
            dir.path().join("wext.toml"),
        ],
        &summary.output,
    );
    assert_eq!(change.kind(), ChangeKind::FullRestart);
    assert!(matches!(
        coordinator.apply(&summary.entrypoints, change).await.unwrap(),
        RebuildOutcome::RestartProcess
    ));
}

#[tokio::test]
async fn public_asset_edit_recopies_assets() {
    let dir = project();
    write(dir.path(), "public/data.json", "{\"v\":1}");
    let config = config(dir.path());
    let builder = Arc::new(StaticBuilder::new(&config));
    let (summary, coordinator) = pipeline::build(config.clone(), builder, Arc::new(NoopHooks))
        .await
        .unwrap();

    write(dir.path(), "public/data.json", "{\"v\":2}");
    let change = detect_dev_changes(
        &config,
        &[config.public_dir.join("data.json")],
        &summary.output,
    );
    assert_eq!(change.kind(), ChangeKind::ExtensionReload);
    assert!(change.rebuild_groups().is_empty());

    let RebuildOutcome::Rebuilt(result) = coordinator
        .apply(&summary.entrypoints, change)
        .await
        .unwrap()
    else {
        panic!("expected a rebuild");
    };
    assert_eq!(result.output.step_ids(), summary.output.step_ids());
    assert_eq!(
        fs::read_to_string(config.out_dir.join("data.json")).unwrap(),
        "{\"v\":2}"
    );
}

#[tokio::test]
async fn dotted_page_edits_are_page_reloads() {
    let dir = project();
    write(dir.path(), "entrypoints/editor.sandbox.html", "<html><body>e1</body></html>");
    write(dir.path(), "entrypoints/notes.sidepanel/index.html", "<html><body>n1</body></html>");
    let config = config(dir.path());
    let builder = Arc::new(StaticBuilder::new(&config));
    let (summary, coordinator) = pipeline::build(config.clone(), builder, Arc::new(NoopHooks))
        .await
        .unwrap();

    let sidepanel = config.entrypoints_dir.join("notes.sidepanel/index.html");
    let change = detect_dev_changes(&config, &[sidepanel], &summary.output);
    assert_eq!(change.kind(), ChangeKind::HtmlReload);

    write(dir.path(), "entrypoints/editor.sandbox.html", "<html><body>e2</body></html>");
    let change = detect_dev_changes(
        &config,
        &[config.entrypoints_dir.join("editor.sandbox.html")],
        &summary.output,
    );
    assert_eq!(change.kind(), ChangeKind::HtmlReload);
    assert_eq!(change.rebuild_groups().len(), 1);

    coordinator.apply(&summary.entrypoints, change).await.unwrap();
    let editor = fs::read_to_string(config.out_dir.join("editor.html")).unwrap();
    assert!(editor.contains("e2"));
}
