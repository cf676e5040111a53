use std::error::Error;
use std::fs;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{sleep, Instant};

use buildpipe::orchestrator::watch;
use buildpipe::watch::{Dispatcher, FsEvent, FsEventKind};
use buildpipe_test_utils::{init_tracing, with_timeout, with_timeout_of, ProjectFixture};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn remove_then_readd_restores_identical_output() -> TestResult {
    init_tracing();
    let project = ProjectFixture::new();
    let source = "export const answer = 40 + 2;\n";
    project.write("src/index.js", source);

    let mut dispatcher = Dispatcher::new(project.pipeline());
    let path = project.path("src/index.js");

    dispatcher.dispatch(FsEvent::new(FsEventKind::Added, &path)).await;
    with_timeout(dispatcher.drain()).await;
    let first = project.read("dist/index.js");

    fs::remove_file(&path)?;
    dispatcher.dispatch(FsEvent::new(FsEventKind::Removed, &path)).await;
    with_timeout(dispatcher.drain()).await;
    assert!(!project.exists("dist/index.js"));

    project.write("src/index.js", source);
    dispatcher.dispatch(FsEvent::new(FsEventKind::Added, &path)).await;
    with_timeout(dispatcher.drain()).await;

    assert_eq!(project.read("dist/index.js"), first);
    Ok(())
}

#[tokio::test]
async fn jobs_for_one_path_run_in_arrival_order() -> TestResult {
    init_tracing();
    let project = ProjectFixture::new();
    project.write("src/a.js", "export const a = 1;\n");

    let mut dispatcher = Dispatcher::new(project.pipeline());
    let path = project.path("src/a.js");

    // Compile then remove: whatever the scheduling, the remove runs last.
    dispatcher.dispatch(FsEvent::new(FsEventKind::Changed, &path)).await;
    dispatcher.dispatch(FsEvent::new(FsEventKind::Removed, &path)).await;
    assert!(dispatcher.in_flight() <= 1);
    with_timeout(dispatcher.drain()).await;

    assert!(!project.exists("dist/a.js"));
    Ok(())
}

#[tokio::test]
async fn directory_events_mirror_and_remove() -> TestResult {
    init_tracing();
    let project = ProjectFixture::new();
    project
        .write("src/index.js", "export default 1;\n")
        .mkdir("src/components/empty")
        .write("src/components/logo.svg", "<svg/>");

    let mut dispatcher = Dispatcher::new(project.pipeline());

    dispatcher
        .dispatch(FsEvent::new(FsEventKind::DirAdded, project.path("src/components")))
        .await;
    with_timeout(dispatcher.drain()).await;
    assert!(project.path("dist/components/empty").is_dir());
    assert_eq!(project.read("dist/components/logo.svg"), "<svg/>");

    fs::remove_dir_all(project.path("src/components"))?;
    dispatcher
        .dispatch(FsEvent::new(FsEventKind::DirRemoved, project.path("src/components")))
        .await;
    with_timeout(dispatcher.drain()).await;
    assert!(!project.exists("dist/components"));
    Ok(())
}

#[tokio::test]
async fn removing_the_source_root_reensures_the_entry() -> TestResult {
    init_tracing();
    let project = ProjectFixture::new();
    project.write("src/index.js", "export default 1;\n").write("dist/index.js", "x");

    let mut dispatcher = Dispatcher::new(project.pipeline());
    fs::remove_dir_all(project.path("src"))?;
    dispatcher
        .dispatch(FsEvent::new(FsEventKind::DirRemoved, project.path("src")))
        .await;
    with_timeout(dispatcher.drain()).await;

    assert!(!project.exists("dist"));
    assert!(project.path("src/index.js").is_file());
    Ok(())
}

#[tokio::test]
async fn handler_failures_do_not_stop_dispatch() -> TestResult {
    init_tracing();
    let project = ProjectFixture::new();
    project
        .write("src/bad.js", "const s = 'open;\n")
        .write("src/good.js", "export const ok = true;\n");

    let mut dispatcher = Dispatcher::new(project.pipeline());
    dispatcher
        .dispatch(FsEvent::new(FsEventKind::Changed, project.path("src/bad.js")))
        .await;
    dispatcher
        .dispatch(FsEvent::new(FsEventKind::Changed, project.path("src/good.js")))
        .await;
    with_timeout(dispatcher.drain()).await;

    assert!(!project.exists("dist/bad.js"));
    assert!(project.exists("dist/good.js"));
    Ok(())
}

#[tokio::test]
async fn live_watcher_compiles_new_files() -> TestResult {
    init_tracing();
    let project = ProjectFixture::new();
    project.mkdir("src");
    let pipeline = project.pipeline();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let watching = watch(pipeline, async {
        let _ = stop_rx.await;
    });

    let driver = async {
        // Give the OS watcher a moment to register.
        sleep(Duration::from_millis(300)).await;
        project.write("src/live.js", "export const live = 1;\n");

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut compiled = false;
        while Instant::now() < deadline {
            if project.exists("dist/live.js")
                && project.read("dist/live.js").contains("exports.live")
            {
                compiled = true;
                break;
            }
            sleep(Duration::from_millis(50)).await;
        }
        let _ = stop_tx.send(());
        compiled
    };

    let (result, compiled) =
        with_timeout_of(Duration::from_secs(20), async { tokio::join!(watching, driver) }).await;
    result?;
    assert!(compiled, "watcher did not compile the new file in time");
    Ok(())
}
