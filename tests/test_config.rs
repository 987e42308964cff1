use std::path::PathBuf;

use vein::config::{Config, DEFAULT_LISTEN_ADDR, DEFAULT_SHUTDOWN_GRACE_SECS};

#[test]
fn test_config_env_overrides() {
    // One test owns the env vars so parallel tests cannot race on them.
    unsafe {
        std::env::set_var("VEIN_CONFIG", "/nonexistent/vein.yaml");
        std::env::remove_var("LISTEN");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.listen_addr, DEFAULT_LISTEN_ADDR);
    assert_eq!(cfg.server.backlog, 1024);
    assert!(cfg.pages.is_empty());

    unsafe {
        std::env::set_var("LISTEN", "0.0.0.0:3000");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.listen_addr().unwrap().port(), 3000);

    unsafe {
        std::env::remove_var("LISTEN");
        std::env::remove_var("VEIN_CONFIG");
    }
}

#[test]
fn test_config_from_yaml() {
    let cfg = Config::from_yaml(
        r#"
server:
  listen_addr: "127.0.0.1:9000"
  backlog: 64
  shutdown_grace_secs: 2
pages:
  - route: /
    template: web/index.html
    title: Home
    text:
      greeting: Hello
"#,
    )
    .unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:9000");
    assert_eq!(cfg.server.backlog, 64);
    assert_eq!(cfg.server.shutdown_grace_secs, 2);
    assert_eq!(cfg.pages.len(), 1);
    assert_eq!(cfg.pages[0].route, "/");
    assert_eq!(cfg.pages[0].title.as_deref(), Some("Home"));
    assert_eq!(cfg.pages[0].description, None);
    assert_eq!(cfg.pages[0].text.get("greeting").unwrap(), "Hello");
}

#[test]
fn test_config_missing_sections_use_defaults() {
    let cfg = Config::from_yaml("pages: []").unwrap();

    assert_eq!(cfg.server.listen_addr, DEFAULT_LISTEN_ADDR);
    assert_eq!(cfg.server.backlog, 1024);
    assert_eq!(cfg.server.shutdown_grace_secs, DEFAULT_SHUTDOWN_GRACE_SECS);
}

#[test]
fn test_config_rejects_page_without_template() {
    assert!(Config::from_yaml("pages:\n  - route: /\n").is_err());
}

#[test]
fn test_config_invalid_listen_addr() {
    let cfg = Config::from_yaml("server:\n  listen_addr: nowhere\n").unwrap();
    assert!(cfg.listen_addr().is_err());
}

#[test]
fn test_config_from_file_resolves_templates() {
    let dir = std::env::temp_dir().join(format!("vein-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("vein.yaml");
    std::fs::write(&path, "pages:\n  - route: /\n    template: index.html\n").unwrap();

    let cfg = Config::from_file(&path).unwrap();
    assert_eq!(cfg.pages[0].template, dir.join(PathBuf::from("index.html")));

    std::fs::remove_dir_all(&dir).unwrap();
}
