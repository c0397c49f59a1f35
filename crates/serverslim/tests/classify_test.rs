mod common;

use common::{classifier, SERVER_RULES};
use proptest::prelude::*;
use serverslim_lib::{Classifier, Ruleset, Verdict};

#[test]
fn test_scenario_paths() {
    let engine = classifier(SERVER_RULES);

    assert_eq!(engine.classify("bin/server.exe", false), Verdict::Keep);
    assert_eq!(engine.classify("textures/wall.dds", false), Verdict::Remove);
    assert_eq!(engine.classify("sound/gun.wav", false), Verdict::Remove);
    assert_eq!(engine.classify("config/server.cfg", false), Verdict::Keep);
}

#[test]
fn test_explain_reports_winning_rule() {
    let engine = classifier(SERVER_RULES);

    let matched = engine.explain("main/video/server.cfg", false).unwrap();
    assert_eq!(matched.rule, "cinematics");
    assert_eq!(matched.verdict, Verdict::Remove);
    assert_eq!(matched.priority, 200);
    assert_eq!(matched.specificity, 2);

    let matched = engine.explain("config/server.cfg", false).unwrap();
    assert_eq!(matched.rule, "config");
}

#[test]
fn test_external_ruleset_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("rules.toml");
    std::fs::write(&path, SERVER_RULES).unwrap();

    let ruleset = Ruleset::from_file(&path).unwrap();
    let engine = Classifier::new(&ruleset.rules).unwrap();

    assert_eq!(engine.len(), 5);
    assert_eq!(engine.classify("textures/wall.dds", false), Verdict::Remove);
}

#[test]
fn test_empty_ruleset_keeps_everything() {
    let engine = Classifier::new(&[]).unwrap();
    assert!(engine.is_empty());
    assert_eq!(engine.classify("textures/wall.dds", false), Verdict::Keep);
    assert_eq!(engine.classify("textures", true), Verdict::Keep);
}

proptest! {
    #[test]
    fn prop_unmatched_paths_are_kept(
        dirs in prop::collection::vec("[a-m]{1,8}", 0..4),
        stem in "[a-z0-9_]{1,12}",
        ext in prop::sample::select(vec!["ff", "gsc", "d3dbsp", "txt", "bin", "arena"]),
    ) {
        let engine = classifier(SERVER_RULES);
        let mut path = dirs.join("/");
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(&format!("{}.{}", stem, ext));

        prop_assert_eq!(engine.classify(&path, false), Verdict::Keep);
        prop_assert!(engine.explain(&path, false).is_none());
    }

    #[test]
    fn prop_classification_is_deterministic_and_case_blind(
        dirs in prop::collection::vec("[a-zA-Z]{1,8}", 0..4),
        ext in prop::sample::select(vec!["dds", "DDS", "wav", "Exe", "cfg", "ff"]),
    ) {
        let engine = classifier(SERVER_RULES);
        let mut path = dirs.join("/");
        path.push_str("/file.");
        path.push_str(ext);

        let first = engine.classify(&path, false);
        prop_assert_eq!(first, engine.classify(&path, false));
        prop_assert_eq!(first, engine.classify(path.to_uppercase(), false));
        prop_assert_eq!(first, engine.classify(path.replace('/', "\\"), false));
    }
}
