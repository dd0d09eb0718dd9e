//! Request parsing with per-field issues, reported together as one
//! `validation_error` response.

use axum::body::Bytes;
use catalog::language::find_language;
use catalog::license::find_license;
use catalog::Platform;
use db::RepoSort;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult, ValidationIssue};

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(field, message));
    }

    pub fn finish<T>(self, value: T) -> ApiResult<T> {
        if self.issues.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self.issues))
        }
    }
}

/// Decoded query string. Keys may repeat (`?language=Rust&language=Go`).
#[derive(Debug, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|raw| url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { pairs }
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn string(&self, key: &str) -> String {
        self.first(key).unwrap_or_default().to_string()
    }

    pub fn platform(&self, v: &mut Validator) -> Platform {
        match self.first("platform") {
            None => Platform::Github,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                v.push("platform", "Platform must be one of github");
                Platform::Github
            }),
        }
    }

    pub fn sort(&self, v: &mut Validator) -> RepoSort {
        match self.first("sort") {
            None => RepoSort::default(),
            Some(raw) => RepoSort::parse(raw).unwrap_or_else(|| {
                v.push(
                    "sort",
                    "Sort must be one of highest_bounty, lowest_bounty, stars, forks",
                );
                RepoSort::default()
            }),
        }
    }

    pub fn languages(&self, v: &mut Validator) -> Option<Vec<String>> {
        self.catalog_list(v, "language", "Language must contain a valid language", |name| {
            find_language(name).is_some()
        })
    }

    pub fn licenses(&self, v: &mut Validator) -> Option<Vec<String>> {
        self.catalog_list(v, "license", "License must contain a valid license", |key| {
            find_license(key).is_some()
        })
    }

    fn catalog_list(
        &self,
        v: &mut Validator,
        key: &str,
        message: &str,
        known: impl Fn(&str) -> bool,
    ) -> Option<Vec<String>> {
        let values = self.all(key);
        if values.is_empty() {
            return None;
        }
        if values.iter().any(|value| !known(value)) {
            v.push(key, message);
        }
        Some(values.into_iter().map(str::to_string).collect())
    }

    pub fn limit(&self, v: &mut Validator) -> u32 {
        self.bounded_integer(v, "limit", "Limit", 1, Some(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self, v: &mut Validator) -> u32 {
        self.bounded_integer(v, "offset", "Offset", 0, None)
            .unwrap_or(0)
    }

    /// Numeric coercion as a form would do it: blank is zero, fractions and
    /// non-numbers are rejected, bounds are inclusive.
    fn bounded_integer(
        &self,
        v: &mut Validator,
        key: &str,
        label: &str,
        min: u32,
        max: Option<u32>,
    ) -> Option<u32> {
        let raw = self.first(key)?.trim();
        let number = if raw.is_empty() {
            0.0
        } else {
            raw.parse::<f64>().unwrap_or(f64::NAN)
        };

        if !number.is_finite() {
            v.push(key, format!("{label} must be an integer number"));
        } else if number < f64::from(min) {
            v.push(
                key,
                format!("{label} must be greater than or equal to {min}"),
            );
        } else if let Some(max) = max.filter(|&max| number > f64::from(max)) {
            v.push(key, format!("{label} must be less than or equal to {max}"));
        } else if number.fract() != 0.0 || number > f64::from(u32::MAX) {
            v.push(key, format!("{label} must be an integer number"));
        } else {
            return Some(number as u32);
        }
        None
    }
}

/// A JSON object body. Missing or empty bodies read as `{}`.
#[derive(Debug, Default)]
pub struct JsonObject(Map<String, Value>);

impl JsonObject {
    pub fn parse(body: &Bytes) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Ok(Self::default()),
            Err(_) => Err(ApiError::bad_request(
                "bad_request",
                "Malformed JSON in request body",
            )),
        }
    }

    /// A string field that must be present. `label` is the capitalised name
    /// used in messages.
    pub fn required_string(&self, v: &mut Validator, key: &str, label: &str) -> Option<String> {
        match self.0.get(key) {
            None | Some(Value::Null) => {
                v.push(key, format!("{label} is required"));
                None
            }
            Some(Value::String(value)) => Some(value.clone()),
            Some(_) => {
                v.push(key, format!("{label} must be a string"));
                None
            }
        }
    }

    pub fn optional_string(&self, v: &mut Validator, key: &str, label: &str) -> Option<String> {
        match self.0.get(key) {
            None => None,
            Some(Value::String(value)) => Some(value.clone()),
            Some(_) => {
                v.push(key, format!("{label} must be a string"));
                None
            }
        }
    }
}
