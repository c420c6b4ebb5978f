//! Behavior of the standalone components through the public API

use medic::classifier::CategoryClassifier;
use medic::{analyze_command, input_detector, judge};
use medic_common::{Category, Idea, InputKind, RiskLevel, SystemInfo};

#[test]
fn test_analyze_command_levels() {
    let wipe = analyze_command("rm -rf /");
    assert_eq!(wipe.risk_level, RiskLevel::High);
    assert!(!wipe.warnings.is_empty());

    let whoami = analyze_command("whoami");
    assert_eq!(whoami.risk_level, RiskLevel::Low);
    assert!(whoami.warnings.is_empty());
    assert!(!whoami.requires_elevation);

    let restart = analyze_command("sudo systemctl restart NetworkManager");
    assert_eq!(restart.risk_level, RiskLevel::Medium);
    assert!(restart.requires_elevation);

    let sudo_wipe = analyze_command("SUDO dd if=/dev/zero of=/dev/sda");
    assert_eq!(sudo_wipe.risk_level, RiskLevel::High);
    assert_eq!(sudo_wipe.warnings.len(), 2);
}

#[test]
fn test_detect_buckets() {
    assert_eq!(input_detector::detect("").label, InputKind::Empty);
    assert_eq!(
        input_detector::detect("user@host:~$ ip addr show").label,
        InputKind::Shell
    );
    assert_eq!(
        input_detector::detect("Traceback (most recent call last):\n  File \"x.py\"").label,
        InputKind::Error
    );
    assert_eq!(
        input_detector::detect("my laptop gets really hot when I watch videos").label,
        InputKind::FreeText
    );
}

#[test]
fn test_classify_examples() {
    let classifier = CategoryClassifier::new();
    assert_eq!(classifier.classify("My WiFi keeps disconnecting").label, Category::Network);
    assert_eq!(classifier.classify("The computer feels slow and laggy").label, Category::Performance);

    let prediction = classifier.classify("grub rescue prompt after boot");
    assert_eq!(prediction.label, Category::Boot);
    assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
    assert!(prediction.candidates.len() <= 3);
}

#[test]
fn test_judge_is_deterministic() {
    let ideas = vec![
        Idea::new("Reinstall the driver", "network", "w")
            .with_fixes(["sudo apt reinstall linux-firmware"])
            .with_risk(RiskLevel::High),
        Idea::new("Soft block", "wifi", "rfkill")
            .with_checks(["rfkill list"])
            .with_fixes(["rfkill unblock wifi"]),
    ];
    let system = SystemInfo::default();

    let first = judge::judge_ideas(ideas.clone(), "wifi will not turn on", &system);
    let second = judge::judge_ideas(ideas, "wifi will not turn on", &system);

    assert_eq!(first[0].idea.hypothesis, "Soft block");
    let totals: Vec<f64> = first.iter().map(|j| j.total_score).collect();
    let again: Vec<f64> = second.iter().map(|j| j.total_score).collect();
    assert_eq!(totals, again);
    assert!(totals.iter().all(|t| (0.0..=1.0).contains(t)));
    assert!(first[1].rationale.contains("High risk approach."));
}
