//! Remote command templates.
//!
//! Publish commands are configured as templates containing `__NAME__`
//! placeholder tokens. Substitution is literal and single-pass: every
//! occurrence of each supplied token in the template is replaced, and the
//! inserted values are copied as-is. Tokens without a supplied value are
//! passed through unchanged.

use log::error;
use once_cell::sync::Lazy;
use regex::Regex;

/// Repository name placeholder.
pub const REPO_NAME: &str = "__REPO_NAME__";
/// Repository path placeholder.
pub const REPO_PATH: &str = "__REPO_PATH__";
/// Repository host placeholder.
pub const REPO_HOST: &str = "__REPO_HOST__";
/// Repository URL placeholder.
pub const REPO_URL: &str = "__REPO_URL__";
/// Space-separated APT releases placeholder.
pub const APT_PLATFORMS: &str = "__APT_PLATFORMS__";
/// Signing key placeholder.
pub const GPG_KEY: &str = "__GPG_KEY__";

const PLACEHOLDER_PATTERN: &str = r"__[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)*__";

static PLACEHOLDER: Lazy<Option<Regex>> = Lazy::new(|| match Regex::new(PLACEHOLDER_PATTERN) {
    Ok(pattern) => Some(pattern),
    Err(err) => {
        error!("placeholder pattern is invalid, unresolved tokens go unreported: {err}");
        None
    }
});

/// Returns the placeholder token for an argument name.
///
/// # Examples
///
/// ```
/// use pkg_publisher::template::placeholder_for;
///
/// assert_eq!(placeholder_for("repo_url"), "__REPO_URL__");
/// ```
#[must_use]
pub fn placeholder_for(argument: &str) -> String {
    format!("__{}__", argument.to_ascii_uppercase())
}

/// Whether `template` uses the placeholder for `argument`.
#[must_use]
pub fn argument_required(argument: &str, template: &str) -> bool {
    template.contains(&placeholder_for(argument))
}

/// Replaces every occurrence of each `(token, value)` pair in `template`.
///
/// The template is scanned once from left to right. Inserted values are never
/// rescanned, so a value that happens to contain a token is kept verbatim.
/// Where two tokens start at the same position the earlier pair wins.
///
/// # Examples
///
/// ```
/// use pkg_publisher::template::{REPO_NAME, REPO_PATH, substitute};
///
/// let command = substitute(
///     "some command with __REPO_NAME__ and __REPO_PATH__ and stuff",
///     &[(REPO_NAME, "puppet5"), (REPO_PATH, "/opt/repository/yum")],
/// );
/// assert_eq!(command, "some command with puppet5 and /opt/repository/yum and stuff");
/// ```
#[must_use]
pub fn substitute(template: &str, replacements: &[(&str, &str)]) -> String {
    let mut command = String::with_capacity(template.len());
    let mut rest = template;
    while let Some((at, token, value)) = next_token(rest, replacements) {
        command.push_str(&rest[..at]);
        command.push_str(value);
        rest = &rest[at + token.len()..];
    }
    command.push_str(rest);
    command
}

fn next_token<'r>(
    text: &str,
    replacements: &[(&'r str, &'r str)],
) -> Option<(usize, &'r str, &'r str)> {
    replacements
        .iter()
        .filter(|(token, _)| !token.is_empty())
        .filter_map(|&(token, value)| text.find(token).map(|at| (at, token, value)))
        .min_by_key(|&(at, _, _)| at)
}

/// Lists placeholder tokens still present in `command`, in order of first
/// appearance.
#[must_use]
pub fn unresolved_placeholders(command: &str) -> Vec<String> {
    let Some(pattern) = PLACEHOLDER.as_ref() else {
        return Vec::new();
    };
    let mut found: Vec<String> = Vec::new();
    for token in pattern.find_iter(command).map(|m| m.as_str()) {
        if !found.iter().any(|seen| seen == token) {
            found.push(token.to_owned());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn substitutes_every_occurrence() {
        let command = substitute(
            "mkdir -p __REPO_PATH__ && cd __REPO_PATH__",
            &[(REPO_PATH, "/opt/repo")],
        );
        assert_eq!(command, "mkdir -p /opt/repo && cd /opt/repo");
    }

    #[test]
    fn substitution_is_idempotent() {
        let template = "publish __REPO_NAME__ to __REPO_URL__";
        let pairs = [(REPO_NAME, "puppet5"), (REPO_URL, "http://apt.example.net")];
        assert_eq!(substitute(template, &pairs), substitute(template, &pairs));
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let command = substitute(
            "sync __REPO_NAME__ for __APT_PLATFORMS__",
            &[(REPO_NAME, "__APT_PLATFORMS__"), (APT_PLATFORMS, "stretch xenial")],
        );
        assert_eq!(command, "sync __APT_PLATFORMS__ for stretch xenial");
    }

    #[test]
    fn later_values_are_not_rescanned_for_earlier_tokens() {
        let command = substitute(
            "__REPO_PATH__/__REPO_NAME__",
            &[(REPO_NAME, "puppet5"), (REPO_PATH, "/srv/__REPO_NAME__")],
        );
        assert_eq!(command, "/srv/__REPO_NAME__/puppet5");
    }

    #[test]
    fn empty_tokens_are_ignored() {
        assert_eq!(substitute("createrepo", &[("", "x")]), "createrepo");
    }

    #[test]
    fn placeholder_pattern_compiles() {
        assert!(PLACEHOLDER.is_some());
    }

    #[test]
    fn unknown_placeholders_pass_through() {
        let command = substitute("sync __REPO_NAME__ __MYSTERY__", &[(REPO_NAME, "puppet5")]);
        assert_eq!(command, "sync puppet5 __MYSTERY__");
        assert_eq!(unresolved_placeholders(&command), vec!["__MYSTERY__"]);
    }

    #[rstest]
    #[case::plain("no tokens here", &[])]
    #[case::repeated("__A__ __B_2__ __A__", &["__A__", "__B_2__"])]
    #[case::lower_case_ignored("__repo_name__ __REPO_HOST__", &["__REPO_HOST__"])]
    #[case::dunder_only("a ____ b", &[])]
    fn finds_unresolved_placeholders(#[case] command: &str, #[case] expected: &[&str]) {
        assert_eq!(unresolved_placeholders(command), expected);
    }

    #[rstest]
    #[case::present("repo_url", "curl __REPO_URL__", true)]
    #[case::absent("repo_url", "curl __REPO_NAME__", false)]
    #[case::partial_token("repo", "curl __REPO_URL__", false)]
    fn detects_required_arguments(
        #[case] argument: &str,
        #[case] template: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(argument_required(argument, template), expected);
    }
}
