//! Handler definitions loaded from YAML become registered journal handlers.

use std::io::Write;

use chrono::NaiveTime;
use lifelog_router::{AppContext, ConfigLoader};

fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

#[tokio::test]
async fn test_yaml_handlers_replace_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("router.db");
    let path = write_config(
        &dir,
        &format!(
            r"
timezone: Europe/Berlin
database:
  path: {}
handlers:
  - name: reading
    description: Logs books and chapters read.
    keywords: [finished reading, chapter]
    question_patterns: ['how many (books|pages)']
    scheduled_tasks:
      - name: weekly_reading_report
        at: '19:30'
  - name: mood
    keywords: [feeling]
    enabled: false
",
            db.display()
        ),
    );

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let ctx = AppContext::build(config).await.unwrap();

    assert_eq!(ctx.registry.names(), vec!["reading"]);
    let tasks = ctx.registry.scheduled_tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].handler_name, "reading");
    assert_eq!(tasks[0].task.at, NaiveTime::from_hms_opt(19, 30, 0).unwrap());
    assert!(db.exists());

    ctx.shutdown().await;
}

#[test]
fn test_invalid_handler_definitions_are_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let duplicate = write_config(
        &dir,
        r"
handlers:
  - name: reading
  - name: reading
",
    );
    assert!(ConfigLoader::load_from_file(&duplicate).is_err());

    let bad_time = write_config(
        &dir,
        r"
handlers:
  - name: reading
    scheduled_tasks:
      - name: report
        at: '7pm'
",
    );
    assert!(ConfigLoader::load_from_file(&bad_time).is_err());

    let bad_pattern = write_config(
        &dir,
        r"
handlers:
  - name: reading
    question_patterns: ['(unclosed']
",
    );
    assert!(ConfigLoader::load_from_file(&bad_pattern).is_err());
}

#[test]
fn test_environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r"
routing:
  dispatch_threshold: 0.8
",
    );

    temp_env::with_var("LIFELOG_ROUTING__DISPATCH_THRESHOLD", Some("0.75"), || {
        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert!((config.routing.dispatch_threshold - 0.75).abs() < f64::EPSILON);
    });
}
