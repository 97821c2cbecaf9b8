//! Recognizable text emitted by terraform and by this crate.
//!
//! Terraform reports outcomes as human-readable banners, so callers match
//! captured output against these substrings.

/// Error text when no credentials are set on the session.
pub const ERROR_MISSING_CREDENTIALS: &str = "no credentials specified for running terraform actions";

/// Error text when no configuration is set on the session.
pub const ERROR_MISSING_CONFIG: &str = "no configuration supplied for running terraform actions";

/// Banner printed by a successful `terraform apply`.
pub const APPLY_SUCCESS: &str = "Apply complete! Resources:";

/// Banner printed by a successful `terraform destroy`.
pub const DESTROY_SUCCESS: &str = "Destroy complete! Resources:";

/// Banner printed when the configuration cannot be planned.
pub const PLAN_FAILURE: &str = "There are some problems with the configuration";

pub fn is_apply_success(stdout: &str) -> bool {
    stdout.contains(APPLY_SUCCESS)
}

pub fn is_destroy_success(stdout: &str) -> bool {
    stdout.contains(DESTROY_SUCCESS)
}
