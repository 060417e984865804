// =============================================================================
// matcher.rs — IS ANYBODY HOME?
// =============================================================================
//
// The whole verdict, in one boolean expression: the status code must be the
// one the registry says an existing account returns, AND the body must
// contain the registry's fragment. A 200 with no evidence in the body is
// just a 200.
// =============================================================================

use reqwest::StatusCode;

use crate::models::Site;

/// `true` iff `status` equals the site's exists code and `body` contains the
/// site's exists fragment as a literal, case-sensitive substring.
///
/// The missing-account signature is deliberately not consulted.
pub fn is_match(status: StatusCode, body: &[u8], site: &Site) -> bool {
    status.as_u16() == site.exists_code
        && memchr::memmem::find(body, site.exists_string.as_bytes()).is_some()
}
