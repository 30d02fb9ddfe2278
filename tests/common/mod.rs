#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

pub const CARDS_CSV: &str = "\
card_key,card_name,issuer,issuer_url,verified_date,dining_multiplier,grocery_multiplier,gas_multiplier,travel_multiplier,other_multiplier,reward_currency,notes,program_links,conditions
freedom_flex,Freedom Flex,Chase,https://chase.test/flex,2024-05-01,3,1,1,5,1,Cashback,portal_note: 5x through the travel portal,freedom_5,Activate each quarter
sapphire,Sapphire Preferred,Chase,https://chase.test/sapphire,2024-05-01,3,1,1,2,1,points,,,
";

pub const PROGRAMS_CSV: &str = "\
program_key,program_name,issuer,source_url,requires_activation,cap_amount,cap_period,base_rate,bonus_rate,notes,status,last_verified
freedom_5,Freedom 5%,Chase,https://chase.test/calendar,yes,1500,quarter,1,5,,verified,2024-04-01
";

pub const QUARTERS_CSV: &str = "\
program_key,start_date,end_date,category,status,last_verified
freedom_5,2024-04-01,2024-06-30,restaurants,verified,
freedom_5,2024-07-01,2024-09-30,gas,verified,
";

/// Sheet files on disk plus their `file://` URLs.
pub struct Sheets {
    pub cards: String,
    pub programs: String,
    pub program_quarters: String,
}

pub fn write_sheets(dir: &Path) -> Sheets {
    std::fs::create_dir_all(dir).unwrap();
    let write = |name: &str, content: &str| -> String {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        format!("file://{}", path.display())
    };
    Sheets {
        cards: write("cards.csv", CARDS_CSV),
        programs: write("programs.csv", PROGRAMS_CSV),
        program_quarters: write("program_quarters.csv", QUARTERS_CSV),
    }
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A working copy cloned from a bare remote, with one initial commit pushed
/// upstream. Returns the working copy path.
pub fn init_repo_with_remote(root: &Path) -> PathBuf {
    let remote = root.join("remote.git");
    let work = root.join("work");
    std::fs::create_dir_all(&remote).unwrap();
    git(&remote, &["init", "--bare", "-q"]);
    git(
        root,
        &["clone", "-q", &remote.to_string_lossy(), &work.to_string_lossy()],
    );

    git(&work, &["config", "user.name", "Bundle Bot"]);
    git(&work, &["config", "user.email", "bundle-bot@example.test"]);
    git(&work, &["config", "commit.gpgsign", "false"]);

    std::fs::write(work.join("README.md"), "card data\n").unwrap();
    git(&work, &["add", "README.md"]);
    git(&work, &["commit", "-q", "-m", "Initial commit"]);
    git(&work, &["push", "-q", "-u", "origin", "HEAD"]);
    work
}
