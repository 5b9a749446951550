/// Returns true if `host` is the allowed host or ends with it
///
/// This is a plain suffix test on the lowercased host, so `app.poap.xyz` is accepted
/// for `poap.xyz`. Ports are not part of the comparison.
pub fn host_allowed(host: &str, allowed_host: &str) -> bool {
    let host = host.to_lowercase();
    let allowed = allowed_host.to_lowercase();
    host == allowed || host.ends_with(&allowed)
}
