//! Schema validation for upstream GitHub payloads.
//!
//! GitHub reports lookup failures as a JSON object too ("Not Found"), so
//! every payload goes through these checks before anything renders. A
//! failed check reports every offending field, not just the first one.

use serde_json::{Map, Value};
use url::Url;

use crate::error::{FieldIssue, ValidationError};
use crate::models::{Repository, UserProfile};

#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, field: impl Into<String>, problem: impl Into<String>) {
        self.0.push(FieldIssue {
            field: field.into(),
            problem: problem.into(),
        });
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validates a `/users/{username}` payload into a [`UserProfile`].
pub fn parse_user(value: &Value) -> Result<UserProfile, ValidationError> {
    let Some(obj) = value.as_object() else {
        return Err(ValidationError::single("payload", "expected a JSON object"));
    };

    let mut issues = Issues::default();
    let id = required_u64(obj, "id", &mut issues);
    let login = required_string(obj, "login", &mut issues);
    let avatar_url = required_url(obj, "avatar_url", &mut issues);
    let name = optional_string(obj, "name", &mut issues);
    let bio = optional_string(obj, "bio", &mut issues);
    let location = optional_string(obj, "location", &mut issues);
    let followers = count(obj, "followers", &mut issues);
    let following = count(obj, "following", &mut issues);
    let public_repos = count(obj, "public_repos", &mut issues);
    let html_url = optional_url(obj, "html_url", &mut issues);

    match (id, login, avatar_url) {
        (Some(id), Some(login), Some(avatar_url)) if issues.is_empty() => Ok(UserProfile {
            id,
            login,
            avatar_url,
            name,
            bio,
            location,
            followers,
            following,
            public_repos,
            html_url,
        }),
        _ => Err(ValidationError::new(issues.0)),
    }
}

/// Validates a `/users/{username}/repos` payload into a repository list.
/// Issues from individual elements are scoped with the element index.
pub fn parse_repos(value: &Value) -> Result<Vec<Repository>, ValidationError> {
    let Some(items) = value.as_array() else {
        return Err(ValidationError::single("payload", "expected a JSON array"));
    };

    let mut issues = Issues::default();
    let mut repos = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match parse_repo(item) {
            Ok(repo) => repos.push(repo),
            Err(err) => {
                for issue in err.issues {
                    issues.push(format!("[{idx}].{}", issue.field), issue.problem);
                }
            }
        }
    }

    if issues.is_empty() {
        Ok(repos)
    } else {
        Err(ValidationError::new(issues.0))
    }
}

fn parse_repo(value: &Value) -> Result<Repository, ValidationError> {
    let Some(obj) = value.as_object() else {
        return Err(ValidationError::single("payload", "expected a JSON object"));
    };

    let mut issues = Issues::default();
    let id = required_u64(obj, "id", &mut issues);
    let name = required_string(obj, "name", &mut issues);
    let full_name = required_string(obj, "full_name", &mut issues);
    let html_url = required_string(obj, "html_url", &mut issues);
    let description = nullable_string(obj, "description", &mut issues);
    let stargazers_count = count(obj, "stargazers_count", &mut issues);
    let forks_count = count(obj, "forks_count", &mut issues);
    let open_issues_count = count(obj, "open_issues_count", &mut issues);
    let language = nullable_string(obj, "language", &mut issues);
    let private = required_bool(obj, "private", &mut issues);
    let fork = required_bool(obj, "fork", &mut issues);
    let created_at = optional_string(obj, "created_at", &mut issues);
    let updated_at = optional_string(obj, "updated_at", &mut issues);
    let pushed_at = optional_string(obj, "pushed_at", &mut issues);

    match (id, name, full_name, html_url, private, fork) {
        (Some(id), Some(name), Some(full_name), Some(html_url), Some(private), Some(fork))
            if issues.is_empty() =>
        {
            Ok(Repository {
                id,
                name,
                full_name,
                html_url,
                description,
                stargazers_count,
                forks_count,
                open_issues_count,
                language,
                private,
                fork,
                created_at,
                updated_at,
                pushed_at,
            })
        }
        _ => Err(ValidationError::new(issues.0)),
    }
}

fn required_u64(obj: &Map<String, Value>, field: &str, issues: &mut Issues) -> Option<u64> {
    match obj.get(field) {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) => Some(v),
            None => {
                issues.push(field, "expected a non-negative integer");
                None
            }
        },
        Some(_) => {
            issues.push(field, "expected a number");
            None
        }
        None => {
            issues.push(field, "missing");
            None
        }
    }
}

fn required_string(obj: &Map<String, Value>, field: &str, issues: &mut Issues) -> Option<String> {
    match obj.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(field, "expected a string");
            None
        }
        None => {
            issues.push(field, "missing");
            None
        }
    }
}

fn required_bool(obj: &Map<String, Value>, field: &str, issues: &mut Issues) -> Option<bool> {
    match obj.get(field) {
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            issues.push(field, "expected a boolean");
            None
        }
        None => {
            issues.push(field, "missing");
            None
        }
    }
}

/// Key may be absent or null; a present value must be a string.
fn optional_string(obj: &Map<String, Value>, field: &str, issues: &mut Issues) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(field, "expected a string or null");
            None
        }
    }
}

/// Key must be present; the value may be null.
fn nullable_string(obj: &Map<String, Value>, field: &str, issues: &mut Issues) -> Option<String> {
    match obj.get(field) {
        Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(field, "expected a string or null");
            None
        }
        None => {
            issues.push(field, "missing");
            None
        }
    }
}

/// Numeric counter that defaults to 0 when absent or null.
fn count(obj: &Map<String, Value>, field: &str, issues: &mut Issues) -> u64 {
    match obj.get(field) {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) => v,
            None => {
                issues.push(field, "expected a non-negative integer");
                0
            }
        },
        Some(_) => {
            issues.push(field, "expected a number");
            0
        }
    }
}

fn required_url(obj: &Map<String, Value>, field: &str, issues: &mut Issues) -> Option<Url> {
    required_string(obj, field, issues).and_then(|s| match Url::parse(&s) {
        Ok(url) => Some(url),
        Err(_) => {
            issues.push(field, "not a well-formed URL");
            None
        }
    })
}

fn optional_url(obj: &Map<String, Value>, field: &str, issues: &mut Issues) -> Option<Url> {
    optional_string(obj, field, issues).and_then(|s| match Url::parse(&s) {
        Ok(url) => Some(url),
        Err(_) => {
            issues.push(field, "not a well-formed URL");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn full_user() -> Value {
        json!({
            "id": 583231,
            "login": "octocat",
            "avatar_url": "https://avatars.githubusercontent.com/u/583231?v=4",
            "name": "The Octocat",
            "bio": null,
            "location": "San Francisco",
            "followers": 17000,
            "following": 9,
            "public_repos": 8,
            "html_url": "https://github.com/octocat"
        })
    }

    #[test]
    fn accepts_a_complete_user() {
        let user = parse_user(&full_user()).unwrap();
        assert_eq!(user.login, "octocat");
        assert_eq!(user.name.as_deref(), Some("The Octocat"));
        assert_eq!(user.bio, None);
        assert_eq!(user.followers, 17000);
        assert_eq!(user.avatar_url.host_str(), Some("avatars.githubusercontent.com"));
    }

    #[test]
    fn missing_counts_default_to_zero() {
        let mut value = full_user();
        let obj = value.as_object_mut().unwrap();
        obj.remove("followers");
        obj.remove("following");
        obj.remove("public_repos");

        let user = parse_user(&value).unwrap();
        assert_eq!(user.followers, 0);
        assert_eq!(user.following, 0);
        assert_eq!(user.public_repos, 0);
    }

    #[test]
    fn malformed_avatar_url_names_the_field() {
        let mut value = full_user();
        value["avatar_url"] = json!("not a url");

        let err = parse_user(&value).unwrap_err();
        assert!(err.issues.iter().any(|i| i.field == "avatar_url"));
        assert!(err.to_string().contains("avatar_url"));
    }

    #[test]
    fn collects_every_offending_field() {
        let mut value = full_user();
        value["avatar_url"] = json!(42);
        value["followers"] = json!(-3);
        value["login"] = json!(null);

        let err = parse_user(&value).unwrap_err();
        let fields: Vec<&str> = err.issues.iter().map(|i| i.field.as_str()).collect();
        assert!(fields.contains(&"avatar_url"));
        assert!(fields.contains(&"followers"));
        assert!(fields.contains(&"login"));
    }

    #[test]
    fn not_found_error_object_is_rejected() {
        let value = json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        });
        let err = parse_user(&value).unwrap_err();
        assert!(err.issues.iter().any(|i| i.field == "login"));
        assert!(err.issues.iter().any(|i| i.field == "avatar_url"));
    }

    fn full_repo(name: &str) -> Value {
        json!({
            "id": 1296269,
            "name": name,
            "full_name": format!("octocat/{name}"),
            "html_url": format!("https://github.com/octocat/{name}"),
            "description": "This your first repo!",
            "stargazers_count": 80,
            "forks_count": 9,
            "open_issues_count": 0,
            "language": "Ruby",
            "private": false,
            "fork": false,
            "created_at": "2011-01-26T19:01:12Z",
            "updated_at": "2011-01-26T19:14:43Z",
            "pushed_at": "2011-01-26T19:06:43Z"
        })
    }

    #[test]
    fn repo_order_is_preserved() {
        let value = json!([full_repo("hello-world"), full_repo("spoon-knife")]);
        let repos = parse_repos(&value).unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "hello-world");
        assert_eq!(repos[1].name, "spoon-knife");
    }

    #[test]
    fn nullable_repo_fields_accept_null() {
        let mut value = full_repo("bare");
        value["description"] = json!(null);
        value["language"] = json!(null);
        value["pushed_at"] = json!(null);

        let repo = parse_repo(&value).unwrap();
        assert_eq!(repo.description, None);
        assert_eq!(repo.language, None);
        assert_eq!(repo.pushed_at, None);
    }

    #[test]
    fn bad_element_issues_are_index_scoped() {
        let mut broken = full_repo("broken");
        broken["name"] = json!(7);
        let value = json!([full_repo("fine"), broken]);

        let err = parse_repos(&value).unwrap_err();
        assert!(err.issues.iter().any(|i| i.field == "[1].name"));
        assert!(!err.issues.iter().any(|i| i.field.starts_with("[0]")));
    }

    #[test]
    fn non_array_repo_payload_is_rejected() {
        let err = parse_repos(&json!({"message": "Not Found"})).unwrap_err();
        assert_eq!(err.issues[0].field, "payload");
    }
}
