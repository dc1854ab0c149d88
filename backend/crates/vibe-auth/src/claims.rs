use crate::context::{AuthenticatedPrincipal, ExtractedClaims};
use crate::error::{AuthError, AuthResult};
use serde_json::Value;
use vibe_commons::ProviderRecord;

/// Well-known subject claims, after the provider's configured path.
const SUBJECT_ALIASES: &[&str] = &[
    "sub",
    "oid",
    "http://schemas.microsoft.com/identity/claims/objectidentifier",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
    "uid",
    "user_id",
];

const ROLE_ALIASES: &[&str] = &[
    "roles",
    "role",
    "groups",
    "realm_access.roles",
    "cognito:groups",
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
];

const EMAIL_ALIASES: &[&str] = &[
    "email",
    "preferred_username",
    "upn",
    "unique_name",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress",
];

/// Maps a verified principal to subject, roles and email.
///
/// For each field the provider's configured claim path is tried first, then
/// the built-in aliases in order. Claim names match case-insensitively and
/// dotted paths (`realm_access.roles`) walk nested objects.
pub struct ClaimExtractor;

impl ClaimExtractor {
    pub fn extract(
        principal: &AuthenticatedPrincipal,
        provider: &ProviderRecord,
    ) -> AuthResult<ExtractedClaims> {
        let claims = &principal.claims;

        let subject = candidates(provider.subject_claim.as_deref(), SUBJECT_ALIASES)
            .find_map(|path| lookup(claims, path).and_then(as_subject))
            .ok_or_else(|| AuthError::AuthenticationFailure("Subject claim not found".into()))?;

        let mut roles = candidates(provider.role_claim.as_deref(), ROLE_ALIASES)
            .find_map(|path| lookup(claims, path).and_then(as_roles))
            .unwrap_or_default();

        if roles.is_empty() {
            if let Some(default_role) = provider.default_role.as_deref().filter(|r| !r.is_empty()) {
                roles.push(default_role.to_string());
            }
        }

        let email = candidates(provider.email_claim.as_deref(), EMAIL_ALIASES)
            .find_map(|path| lookup(claims, path).and_then(as_non_empty_str));

        Ok(ExtractedClaims {
            subject,
            roles,
            email,
        })
    }
}

fn candidates<'a>(
    configured: Option<&'a str>,
    aliases: &'a [&'a str],
) -> impl Iterator<Item = &'a str> {
    let configured = configured.map(str::trim).filter(|p| !p.is_empty());
    configured.into_iter().chain(
        aliases
            .iter()
            .copied()
            .filter(move |alias| configured.is_none_or(|c| !c.eq_ignore_ascii_case(alias))),
    )
}

/// Resolve a claim path. An exact (case-insensitive) top-level key wins over
/// a dotted walk, so URI-style claim names containing dots still match.
fn lookup<'a>(claims: &'a serde_json::Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = get_ci(claims, path) {
        return Some(value);
    }

    let (head, rest) = path.split_once('.')?;
    match get_ci(claims, head)? {
        Value::Object(nested) => lookup(nested, rest),
        _ => None,
    }
}

fn get_ci<'a>(claims: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a Value> {
    claims.get(key).or_else(|| {
        claims
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn as_subject(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        other => as_non_empty_str(other),
    }
}

fn as_non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn as_roles(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(role) => Some(vec![role.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect(),
        ),
        _ => None,
    }
}
