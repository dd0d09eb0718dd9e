use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use catalog::language::language_names;
use catalog::license::license_keys;

pub const SEARCH_REPOSITORIES: &str = r#"
query SearchRepositories($query: String!, $first: Int!, $after: String) {
  search(query: $query, type: REPOSITORY, first: $first, after: $after) {
    repositoryCount
    nodes {
      ... on Repository {
        name
        owner { login }
        description
        url
        stargazerCount
        forkCount
        primaryLanguage { name color }
        licenseInfo { key name }
      }
    }
  }
}
"#;

pub const SEARCH_ISSUES: &str = r#"
query SearchIssues($query: String!, $first: Int!, $after: String) {
  search(query: $query, type: ISSUE, first: $first, after: $after) {
    issueCount
    nodes {
      ... on Issue {
        number
        title
        createdAt
        labels(first: 10) {
          nodes { name color }
        }
      }
    }
  }
}
"#;

/// Opaque search cursor positioned so the next page starts at `offset`.
pub fn cursor_for_offset(offset: u32) -> String {
    STANDARD.encode(format!("cursor:{offset}"))
}

fn qualifiers<'a>(key: &str, values: impl IntoIterator<Item = &'a str>) -> String {
    values
        .into_iter()
        .map(|value| format!("{key}:{value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Public repositories sorted by stars. Missing language or license lists
/// fall back to everything the catalog knows.
pub fn build_repository_search_query(
    query: &str,
    languages: Option<&[String]>,
    licenses: Option<&[String]>,
) -> String {
    let languages = match languages {
        Some(list) => qualifiers("language", list.iter().map(String::as_str)),
        None => qualifiers("language", language_names()),
    };
    let licenses = match licenses {
        Some(list) => qualifiers("license", list.iter().map(String::as_str)),
        None => qualifiers("license", license_keys()),
    };
    join_parts([
        "is:public",
        "sort:stars",
        query,
        languages.as_str(),
        licenses.as_str(),
    ])
}

pub fn build_issue_search_query(owner: &str, repo: &str, query: &str) -> String {
    let scope = format!("repo:{owner}/{repo}");
    join_parts([scope.as_str(), "is:issue", "is:open", query])
}
