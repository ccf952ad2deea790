use std::collections::HashMap;
use std::time::Duration;

use hwp2md::{HeadingStyle, Settings};

fn settings(vars: &[(&str, &str)]) -> Settings {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults() {
    let s = settings(&[]);
    assert_eq!(s.api.host, "0.0.0.0");
    assert_eq!(s.api.port, 8000);
    assert_eq!(s.converter.heading_style, HeadingStyle::Atx);
    assert_eq!(s.converter.images_dir_name, "images");
    assert_eq!(s.converter.external_timeout, Duration::from_secs(120));
    assert_eq!(s.log.level, "info");
}

#[test]
fn environment_overrides() {
    let s = settings(&[
        ("API_HOST", "127.0.0.1"),
        ("API_PORT", "9090"),
        ("HEADING_STYLE", "setext"),
        ("IMAGES_DIR_NAME", "assets"),
        ("EXTERNAL_TIMEOUT_SECS", "30"),
        ("LOG_LEVEL", "DEBUG"),
    ]);
    assert_eq!(s.api.host, "127.0.0.1");
    assert_eq!(s.api.port, 9090);
    assert_eq!(s.converter.heading_style, HeadingStyle::Setext);
    assert_eq!(s.converter.images_dir_name, "assets");
    assert_eq!(s.converter.external_timeout, Duration::from_secs(30));
    assert_eq!(s.log.level, "debug");
}

#[test]
fn bad_values_keep_defaults() {
    let s = settings(&[
        ("API_PORT", "eighty"),
        ("HEADING_STYLE", "fancy"),
        ("EXTERNAL_TIMEOUT_SECS", "0"),
        ("IMAGES_DIR_NAME", "   "),
    ]);
    assert_eq!(s.api.port, 8000);
    assert_eq!(s.converter.heading_style, HeadingStyle::Atx);
    assert_eq!(s.converter.external_timeout, Duration::from_secs(120));
    assert_eq!(s.converter.images_dir_name, "images");
}

#[test]
fn options_follow_settings() {
    let s = settings(&[("IMAGES_DIR_NAME", "media"), ("EXTERNAL_TIMEOUT_SECS", "5")]);
    let options = hwp2md::Options::from_settings(&s.converter);
    assert_eq!(options.images_dir_name, "media");
    assert_eq!(options.timeout, Duration::from_secs(5));
    assert_eq!(options.method, hwp2md::Method::Auto);
    assert!(options.output.is_none());
}

const EXPORTED_HTML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<META http-equiv="Content-Type" content="text/html; charset=utf-8"/>
<title>ignored title</title>
<link rel="stylesheet" href="styles.css"/>
<style>p { margin: 0 }</style>
</head>
<body>
<script>alert("x")</script>
<p>첫 문단</p>



<p>둘째 문단</p>
<p><img src="bindata/BIN0001.png" alt="logo"/></p>
</body>
</html>"#;

#[test]
fn html_export_is_cleaned_and_relinked() {
    let mapping = vec![(
        "bindata/BIN0001.png".to_string(),
        "images/BIN0001.png".to_string(),
    )];
    let md = hwp2md::html::to_markdown(EXPORTED_HTML, &mapping);

    assert!(md.contains("첫 문단"), "{md}");
    assert!(md.contains("둘째 문단"), "{md}");
    assert!(md.contains("images/BIN0001.png"), "{md}");
    assert!(!md.contains("bindata/"), "{md}");
    assert!(!md.contains("alert"), "{md}");
    assert!(!md.contains("ignored title"), "{md}");
    assert!(!md.contains("margin"), "{md}");
    assert!(!md.contains("\n\n\n"), "{md}");
    assert!(md.ends_with('\n') && !md.ends_with("\n\n"), "{md:?}");
}

#[test]
fn empty_html_gives_empty_markdown() {
    assert_eq!(hwp2md::html::to_markdown("<html><body></body></html>", &[]), "");
}

#[test]
fn script_end_tag_with_whitespace_is_honoured() {
    let html = "<html><body><SCRIPT type=\"text/javascript\">var hidden = 1;</script ><p>kept paragraph</p></body></html>";
    let md = hwp2md::html::to_markdown(html, &[]);
    assert!(md.contains("kept paragraph"), "{md}");
    assert!(!md.contains("hidden"), "{md}");
}

#[test]
fn void_tags_in_body_are_dropped() {
    let html = r#"<html><body><p>before</p><link rel="x" href="y"><meta name="a" content="b"><p>after</p></body></html>"#;
    let md = hwp2md::html::to_markdown(html, &[]);
    assert!(md.contains("before") && md.contains("after"), "{md}");
    assert!(!md.contains("href") && !md.contains("content="), "{md}");
}
