//! DSN helpers

/// Replace the password component of a DSN with `***`
///
/// Used whenever a DSN is written to a log line or an error message.
/// DSNs without a `user:password@` section are returned unchanged.
pub fn redact_dsn(dsn: &str) -> String {
	let Some(scheme_end) = dsn.find("://") else {
		return dsn.to_string();
	};
	let authority_start = scheme_end + 3;
	let rest = &dsn[authority_start..];

	// Passwords may contain '@'; the last one ends the user-info section
	let Some(at) = rest.rfind('@') else {
		return dsn.to_string();
	};
	match rest[..at].find(':') {
		Some(colon) => format!(
			"{}***{}",
			&dsn[..authority_start + colon + 1],
			&rest[at..]
		),
		None => dsn.to_string(),
	}
}
