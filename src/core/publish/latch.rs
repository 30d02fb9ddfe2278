use crate::environment::Environment;
use crate::error::{Error, Result};

pub const RELEASE_VAR: &str = "RELEASE";
pub const CONFIRM_VAR: &str = "CONFIRM_PUBLISH";

/// Both latch variables must hold their exact values. Only the process
/// snapshot counts; the local env file is never consulted here.
pub fn check(env: &Environment) -> Result<()> {
    let release = env.get_raw(RELEASE_VAR);
    let confirm = env.get_raw(CONFIRM_VAR);

    if release == Some("1") && confirm == Some("YES") {
        return Ok(());
    }

    Err(Error::publish_blocked(
        release.map(String::from),
        confirm.map(String::from),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn both_values_must_match_exactly() {
        let open = Environment::from_pairs([("RELEASE", "1"), ("CONFIRM_PUBLISH", "YES")]);
        assert!(check(&open).is_ok());

        for pairs in [
            vec![],
            vec![("RELEASE", "1")],
            vec![("CONFIRM_PUBLISH", "YES")],
            vec![("RELEASE", "true"), ("CONFIRM_PUBLISH", "YES")],
            vec![("RELEASE", "1"), ("CONFIRM_PUBLISH", "yes")],
            vec![("RELEASE", " 1"), ("CONFIRM_PUBLISH", "YES")],
        ] {
            let err = check(&Environment::from_pairs(pairs)).unwrap_err();
            assert_eq!(err.code, ErrorCode::PublishBlocked);
        }
    }

    #[test]
    fn blocked_details_echo_observed_values() {
        let err = check(&Environment::from_pairs([("RELEASE", "0")])).unwrap_err();
        assert_eq!(err.details["release"], "0");
        assert!(err.details["confirmPublish"].is_null());
    }
}
