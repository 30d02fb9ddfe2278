use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cardbundle::bundle::Sources;
use cardbundle::environment::Environment;
use cardbundle::git::Vcs;
use cardbundle::publish::{Generator, PublishSettings, PublishStage, PublishStatus, Publisher};
use cardbundle::{Error, ErrorCode, Result};
use tempfile::{tempdir, TempDir};

type Calls = Rc<RefCell<Vec<String>>>;

#[derive(Default)]
struct FakeVcs {
    calls: Calls,
    changed: bool,
    fail_sync: bool,
    fail_push: bool,
}

impl Vcs for FakeVcs {
    fn sync(&self) -> Result<()> {
        self.calls.borrow_mut().push("sync".to_string());
        if self.fail_sync {
            return Err(Error::git_sync_failed(Some(1), "CONFLICT (content)"));
        }
        Ok(())
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        self.calls.borrow_mut().push(format!("stage {}", names.join(" ")));
        Ok(())
    }

    fn has_staged_changes(&self, _paths: &[PathBuf]) -> Result<bool> {
        self.calls.borrow_mut().push("diff".to_string());
        Ok(self.changed)
    }

    fn commit(&self, message: &str, _paths: &[PathBuf]) -> Result<String> {
        self.calls.borrow_mut().push(format!("commit {}", message));
        Ok("0123abcd".to_string())
    }

    fn push(&self) -> Result<()> {
        self.calls.borrow_mut().push("push".to_string());
        if self.fail_push {
            return Err(Error::publish_failed("git push", Some(1), "rejected"));
        }
        Ok(())
    }
}

/// Writes a fixed set of files into the output directory.
struct FakeGenerator {
    calls: Calls,
    files: Vec<(&'static str, String)>,
}

impl Generator for FakeGenerator {
    fn generate(&self, sources: &Sources, out_dir: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("generate {}", sources.cards));
        std::fs::create_dir_all(out_dir).unwrap();
        for (name, content) in &self.files {
            std::fs::write(out_dir.join(name), content).unwrap();
        }
        Ok(())
    }
}

const DESCRIPTOR: &str = r#"{"schema_version": 2, "version": "sha256:aaaaaaaaaaaa", "cards_count": 12,
  "programs_count": 2, "program_quarters_count": 8, "conditions_count": 3}"#;

fn full_bundle() -> Vec<(&'static str, String)> {
    vec![
        ("cards.json", "{\"cards\": [{\"conditions\": []}]}\n".to_string()),
        ("programs.json", "{\"programs\": []}\n".to_string()),
        ("program_quarters.json", "{\"program_quarters\": []}\n".to_string()),
        ("cards_version.json", DESCRIPTOR.to_string()),
    ]
}

fn open_latch() -> Vec<(&'static str, &'static str)> {
    vec![
        ("RELEASE", "1"),
        ("CONFIRM_PUBLISH", "YES"),
        ("CARDS_CSV_URL", "https://sheet.test/cards"),
        ("PROGRAMS_CSV_URL", "https://sheet.test/programs"),
        ("PROGRAM_QUARTERS_CSV_URL", "https://sheet.test/quarters"),
        ("PUBLISH_OUT_DIR", "data"),
    ]
}

struct Harness {
    dir: TempDir,
    calls: Calls,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: tempdir().unwrap(),
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn publisher(
        &self,
        env: Vec<(&str, &str)>,
        vcs: FakeVcs,
        files: Vec<(&'static str, String)>,
    ) -> Publisher {
        let settings =
            PublishSettings::from_environment(Environment::from_pairs(env), self.dir.path());
        let vcs = FakeVcs {
            calls: self.calls.clone(),
            ..vcs
        };
        let generator = FakeGenerator {
            calls: self.calls.clone(),
            files,
        };
        Publisher::new(settings, Box::new(vcs), Box::new(generator))
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.dir.path()).unwrap().next().is_none()
    }
}

#[test]
fn blocked_latch_has_no_side_effects() {
    for env in [
        vec![],
        vec![("RELEASE", "1")],
        vec![("CONFIRM_PUBLISH", "YES")],
        vec![("RELEASE", "0"), ("CONFIRM_PUBLISH", "YES")],
    ] {
        let harness = Harness::new();
        let mut env = env;
        env.push(("CARDS_CSV_URL", "https://sheet.test/cards"));

        let err = harness
            .publisher(env, FakeVcs::default(), full_bundle())
            .run()
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::PublishBlocked);
        assert!(harness.calls().is_empty());
        assert!(harness.dir_is_empty());
    }
}

#[test]
fn latch_is_not_read_from_env_file() {
    let harness = Harness::new();
    std::fs::write(
        harness.dir.path().join(".env.local"),
        "RELEASE=1\nCONFIRM_PUBLISH=YES\n",
    )
    .unwrap();

    let err = harness
        .publisher(vec![], FakeVcs::default(), full_bundle())
        .run()
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PublishBlocked);
    assert!(harness.calls().is_empty());
}

#[test]
fn sync_failure_stops_before_generation() {
    let harness = Harness::new();
    let vcs = FakeVcs {
        fail_sync: true,
        ..FakeVcs::default()
    };

    let err = harness.publisher(open_latch(), vcs, full_bundle()).run().unwrap_err();
    assert_eq!(err.code, ErrorCode::GitSyncFailed);
    assert_eq!(harness.calls(), vec!["sync"]);
    assert!(harness.dir_is_empty());
}

#[test]
fn missing_url_is_reported_before_generation() {
    let harness = Harness::new();
    let env: Vec<_> = open_latch()
        .into_iter()
        .filter(|(k, _)| *k != "PROGRAMS_CSV_URL")
        .collect();

    let err = harness
        .publisher(env, FakeVcs::default(), full_bundle())
        .run()
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ConfigMissingKey);
    assert!(err.message.contains("PROGRAMS_CSV_URL"));
    assert_eq!(harness.calls(), vec!["sync"]);
}

#[test]
fn urls_can_come_from_the_env_file() {
    let harness = Harness::new();
    std::fs::write(
        harness.dir.path().join(".env.local"),
        "# local sheet links\nexport PROGRAMS_CSV_URL='https://sheet.test/from-file'\n",
    )
    .unwrap();
    let env: Vec<_> = open_latch()
        .into_iter()
        .filter(|(k, _)| *k != "PROGRAMS_CSV_URL")
        .collect();

    let run = harness
        .publisher(env, FakeVcs::default(), full_bundle())
        .run()
        .unwrap();
    assert_eq!(run.status, PublishStatus::NoChanges);
}

#[test]
fn incomplete_bundle_stages_nothing() {
    let harness = Harness::new();
    let files = vec![("cards.json", "{\"conditions\": []}\n".to_string())];

    let err = harness
        .publisher(open_latch(), FakeVcs::default(), files)
        .run()
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::BundleIncomplete);
    assert_eq!(
        err.details["missing"],
        serde_json::json!(["programs.json", "program_quarters.json", "cards_version.json"])
    );
    assert_eq!(
        harness.calls(),
        vec!["sync", "generate https://sheet.test/cards"]
    );
}

#[test]
fn unchanged_bundle_is_a_successful_no_op() {
    let harness = Harness::new();

    let run = harness
        .publisher(open_latch(), FakeVcs::default(), full_bundle())
        .run()
        .unwrap();

    assert_eq!(run.status, PublishStatus::NoChanges);
    assert!(run.commit.is_none());
    assert_eq!(run.stages.last(), Some(&PublishStage::NoChange));
    assert!(!harness
        .calls()
        .iter()
        .any(|c| c.starts_with("commit") || c == "push"));
}

#[test]
fn changed_bundle_commits_and_pushes_once() {
    let harness = Harness::new();
    let vcs = FakeVcs {
        changed: true,
        ..FakeVcs::default()
    };

    let run = harness.publisher(open_latch(), vcs, full_bundle()).run().unwrap();

    assert_eq!(run.status, PublishStatus::Published);
    assert_eq!(
        run.stages,
        vec![
            PublishStage::Syncing,
            PublishStage::ConfigLoaded,
            PublishStage::Generating,
            PublishStage::Validated,
            PublishStage::Staged,
            PublishStage::Committed,
            PublishStage::Pushed,
        ]
    );
    assert!(run.warnings.is_empty());

    let message = "Update card data: 12 cards, 2 programs, 8 program quarters, 3 with conditions (sha256:aaaaaaaaaaaa)";
    assert_eq!(
        harness.calls(),
        vec![
            "sync".to_string(),
            "generate https://sheet.test/cards".to_string(),
            "stage data/cards.json data/programs.json data/program_quarters.json data/cards_version.json"
                .to_string(),
            "diff".to_string(),
            format!("commit {}", message),
            "push".to_string(),
        ]
    );
    let commit = run.commit.unwrap();
    assert_eq!(commit.sha, "0123abcd");
    assert_eq!(commit.message, message);
}

#[test]
fn malformed_descriptor_falls_back_to_generic_message() {
    let harness = Harness::new();
    let vcs = FakeVcs {
        changed: true,
        ..FakeVcs::default()
    };
    let mut files = full_bundle();
    files[3].1 = "{ truncated".to_string();

    let run = harness.publisher(open_latch(), vcs, files).run().unwrap();
    assert_eq!(
        run.commit.map(|c| c.message).as_deref(),
        Some("Update card data bundle")
    );
}

#[test]
fn missing_marker_warns_but_publishes() {
    let harness = Harness::new();
    let vcs = FakeVcs {
        changed: true,
        ..FakeVcs::default()
    };
    let mut files = full_bundle();
    files[0].1 = "{\"cards\": []}\n".to_string();

    let run = harness.publisher(open_latch(), vcs, files).run().unwrap();
    assert_eq!(run.status, PublishStatus::Published);
    assert_eq!(run.warnings, vec!["cards.json has no 'conditions' field"]);
}

#[test]
fn push_failure_keeps_the_local_commit() {
    let harness = Harness::new();
    let vcs = FakeVcs {
        changed: true,
        fail_push: true,
        ..FakeVcs::default()
    };

    let err = harness.publisher(open_latch(), vcs, full_bundle()).run().unwrap_err();
    assert_eq!(err.code, ErrorCode::PublishFailed);

    let calls = harness.calls();
    assert_eq!(calls.iter().filter(|c| c.starts_with("commit")).count(), 1);
    assert_eq!(calls.last().map(String::as_str), Some("push"));
}

#[test]
fn combined_variant_publishes_two_files() {
    let harness = Harness::new();
    let vcs = FakeVcs {
        changed: true,
        ..FakeVcs::default()
    };
    let env = vec![
        ("RELEASE", "1"),
        ("CONFIRM_PUBLISH", "YES"),
        ("PUBLISH_VARIANT", "combined"),
        ("CSV_URL", "https://sheet.test/all"),
        ("PUBLISH_MARKERS", ""),
    ];
    let files = vec![
        ("cards.json", "{\"cards\": []}\n".to_string()),
        ("cards_version.json", r#"{"cards_count": 4}"#.to_string()),
    ];

    let run = harness.publisher(env, vcs, files).run().unwrap();
    assert_eq!(run.files, vec!["./cards.json", "./cards_version.json"]);
    assert!(run.warnings.is_empty());
    assert_eq!(
        run.commit.map(|c| c.message).as_deref(),
        Some("Update card data: 4 cards")
    );
}
