use serde::Serialize;
use url::Url;

/// A validated GitHub user profile from the `/users/{username}` API.
///
/// Counts default to 0 when the upstream payload omits them; URL-typed
/// fields are guaranteed well-formed by the schema layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: u64,
    pub login: String,
    pub avatar_url: Url,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub public_repos: u64,
    pub html_url: Option<Url>,
}

/// A validated repository entry from the `/users/{username}/repos` API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
    pub language: Option<String>,
    pub private: bool,
    pub fork: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub pushed_at: Option<String>,
}
