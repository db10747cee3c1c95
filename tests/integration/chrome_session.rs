use crate::common::*;
use groucho::browser::BrowserSession;
use groucho::config::Config;
use groucho::outcome::Outcome;

fn session(project: &TestProject) -> BrowserSession {
    let root = project.root().to_str().unwrap().to_string();
    let profiles = project.profiles_path.to_str().unwrap().to_string();
    let port = project.debug_port.to_string();
    let chrome = std::env::var("CHROME_PATH").ok();
    let config = Config::from_lookup(
        |k| match k {
            "GROUCHO_PROJECT_ROOT" => Some(root.clone()),
            "GROUCHO_CHROME_PROFILES_PATH" => Some(profiles.clone()),
            "GROUCHO_CHROME_DEBUG_PORT" => Some(port.clone()),
            "CHROME_PATH" => chrome.clone(),
            _ => None,
        },
        project.root(),
    )
    .unwrap();
    BrowserSession::new(&config)
}

#[tokio::test]
async fn headless_chrome_start_status_stop() {
    let project = TestProject::empty();
    let mut session = session(&project);
    if session.executable().is_err() {
        eprintln!("skipping: no Chrome executable on this host");
        return;
    }

    let args = vec!["--headless=new".to_string(), "--no-sandbox".to_string()];
    let started = session
        .start("itest", Some("about:blank"), &args)
        .await
        .unwrap();
    assert_eq!(started, Outcome::Applied);
    assert!(project.profiles_path.join("chrome-profile-itest").is_dir());

    let status = session.status().await;
    assert!(status.running);
    assert!(status.debugging_available);
    assert_eq!(status.active_profile.as_deref(), Some("itest"));
    assert!(status.browser_version.is_some());

    // already up
    assert_eq!(
        session.start("itest", None, &args).await.unwrap(),
        Outcome::Unchanged
    );

    assert_eq!(session.stop(true).await.unwrap(), Outcome::Applied);
    assert!(!session.is_running().await);
    assert_eq!(session.stop(true).await.unwrap(), Outcome::Unchanged);
}
