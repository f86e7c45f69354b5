use std::fs;

use climatiseur::config::MailSecurity;
use climatiseur::format_diagnostics;
use climatiseur::Config;
use tempfile::TempDir;

#[test]
fn test_load_from_disk() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("climatiseur.toml");
    fs::write(
        &path,
        r#"
        sender = "Climatiseur <climatiseur@example.com>"
        notify = ["me@example.com"]
        portals = ["Front Door", "Garage Door", "Patio Door"]

        [thermostats]
        family_room = "Family Room Thermostat"
        living_room = "Living Room Thermostat"

        [mail]
        host = "localhost"
        security = "none"
        "#,
    )
    .unwrap();

    let (config, diagnostics) = Config::from_file(&path).unwrap();

    assert!(diagnostics.is_empty());
    assert_eq!(config.portals.len(), 3);
    assert_eq!(config.mail.security, MailSecurity::None);
    assert_eq!(config.mail.port, 25);
    assert_eq!(config.check.max_age_secs, 5000);
}

#[test]
fn test_missing_fields_formatted() {
    let diagnostics = Config::from_str_at("climatiseur.toml", "portals = []\n").unwrap_err();
    let output = format_diagnostics(&diagnostics.0);

    let expected = "\u{1b}[31mError\u{1b}[0m: Validation error in 'sender'\n  ┌─ climatiseur.toml:1:1\n  │\n  = sender is required\n\n\
                    \u{1b}[31mError\u{1b}[0m: Validation error in 'notify'\n  ┌─ climatiseur.toml:1:1\n  │\n  = notify is required (use [] to only log alerts)\n\n\
                    \u{1b}[31mError\u{1b}[0m: Validation error in 'mail'\n  ┌─ climatiseur.toml:1:1\n  │\n  = mail settings are required\n\n";
    assert_eq!(output, expected);
}

#[test]
fn test_syntax_error_points_at_source() {
    let diagnostics =
        Config::from_str_at("climatiseur.toml", "sender = \"unterminated\n").unwrap_err();
    let output = format_diagnostics(&diagnostics.0);

    assert!(output.contains("Failed to parse"));
    assert!(output.contains("climatiseur.toml"));
}

#[test]
fn test_unreadable_file() {
    let temp_dir = TempDir::new().unwrap();
    let diagnostics = Config::from_file(temp_dir.path().join("missing.toml")).unwrap_err();

    assert!(diagnostics.has_errors());
    let output = format_diagnostics(&diagnostics.0);
    assert!(output.contains("missing.toml"));
}
