use iamscan_core::{Omission, Outcome, ScanConfig, ScanError};
use serde_json::Value as Json;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

pub mod scenarios;

/// Resource value granting access to everything.
pub const WILDCARD: &str = "*";

/// Single-pass wildcard check over `PolicyDocument.Statement`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner { pub strict: bool }

impl Scanner {
    pub fn new(strict: bool) -> Self { Self { strict } }

    pub fn from_config(cfg: &ScanConfig) -> Self { Self::new(cfg.strict) }

    #[tracing::instrument(level = "debug", skip_all, fields(len = text.len(), strict = self.strict))]
    pub fn scan(&self, text: &str) -> Outcome {
        match serde_json::from_str::<Json>(text) {
            Ok(doc) => self.scan_value(&doc),
            Err(e) => {
                warn!(error = %e, "policy is not valid JSON");
                Outcome::Malformed(e.into())
            }
        }
    }

    /// Stops at the first non-object statement or the first wildcard grant,
    /// whichever comes first.
    pub fn scan_value(&self, doc: &Json) -> Outcome {
        let Some(policy) = doc.get("PolicyDocument") else {
            return self.omitted(Omission::MissingPolicyDocument);
        };
        let Some(statements) = policy.get("Statement") else {
            return self.omitted(Omission::MissingStatement);
        };
        let Some(statements) = statements.as_array() else {
            let found = json_type(statements);
            warn!(found, "`Statement` is not an array");
            return Outcome::Malformed(ScanError::StructuralType {
                field: "PolicyDocument.Statement",
                expected: "an array",
                found,
            });
        };

        for (index, statement) in statements.iter().enumerate() {
            let Some(fields) = statement.as_object() else {
                return self.omitted(Omission::NonObjectStatement { index });
            };
            if fields.get("Resource").and_then(Json::as_str) == Some(WILDCARD) {
                debug!(statement = index, "wildcard resource grant");
                return Outcome::Unsafe { statement: index };
            }
        }
        debug!(statements = statements.len(), "no wildcard resource grant");
        Outcome::clean()
    }

    /// Reads and scans a policy file. Read failures come back as `Malformed`.
    pub fn scan_file(&self, path: &Path) -> Outcome {
        match std::fs::read_to_string(path) {
            Ok(text) => self.scan(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "policy file not found");
                Outcome::Malformed(ScanError::NotFound(path.to_path_buf()))
            }
            Err(source) => {
                warn!(path = %path.display(), error = %source, "cannot read policy file");
                Outcome::Malformed(ScanError::Io { path: path.to_path_buf(), source })
            }
        }
    }

    fn omitted(&self, omission: Omission) -> Outcome {
        if self.strict {
            warn!(%omission, "incomplete policy rejected");
            Outcome::Malformed(ScanError::Omitted(omission))
        } else {
            debug!(%omission, "incomplete policy treated as safe");
            Outcome::Safe { omission: Some(omission) }
        }
    }
}

fn json_type(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iamscan_core::OutcomeKind;
    use serde_json::json;

    fn lenient(text: &str) -> Outcome { Scanner::default().scan(text) }

    #[test]
    fn specific_resource_is_safe() {
        let out = lenient(r#"{"PolicyDocument":{"Statement":[{"Resource":"arn:aws:s3:::x","Effect":"Allow"}]}}"#);
        assert!(matches!(out, Outcome::Safe { omission: None }));
    }

    #[test]
    fn wildcard_resource_is_unsafe() {
        let out = lenient(r#"{"PolicyDocument":{"Statement":[{"Resource":"*"}]}}"#);
        assert!(matches!(out, Outcome::Unsafe { statement: 0 }));
    }

    #[test]
    fn first_wildcard_wins_regardless_of_neighbours() {
        let doc = json!({"PolicyDocument": {"Statement": [
            {"Resource": "arn:aws:s3:::a"},
            {"Resource": "*", "Effect": "Deny"},
            "trailing junk",
            {"Resource": "*"}
        ]}});
        assert!(matches!(Scanner::default().scan_value(&doc), Outcome::Unsafe { statement: 1 }));
    }

    #[test]
    fn missing_policy_document_is_safe() {
        let out = lenient(r#"{"Statement":[]}"#);
        assert!(matches!(out, Outcome::Safe { omission: Some(Omission::MissingPolicyDocument) }));
    }

    #[test]
    fn non_object_policy_document_counts_as_missing_statement() {
        let out = lenient(r#"{"PolicyDocument":"not_a_dict","Statement":[]}"#);
        assert!(matches!(out, Outcome::Safe { omission: Some(Omission::MissingStatement) }));
        let out = lenient(r#"{"PolicyDocument":{}}"#);
        assert!(matches!(out, Outcome::Safe { omission: Some(Omission::MissingStatement) }));
    }

    #[test]
    fn non_object_top_level_is_missing_policy_document() {
        for text in ["[]", "42", "\"PolicyDocument\"", "null"] {
            assert!(
                matches!(lenient(text), Outcome::Safe { omission: Some(Omission::MissingPolicyDocument) }),
                "input: {}", text
            );
        }
    }

    #[test]
    fn non_list_statement_is_structural_type_error() {
        let out = lenient(r#"{"PolicyDocument":{"Statement":"not_a_list"}}"#);
        match out {
            Outcome::Malformed(ScanError::StructuralType { field, found, .. }) => {
                assert_eq!(field, "PolicyDocument.Statement");
                assert_eq!(found, "a string");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        let out = lenient(r#"{"PolicyDocument":{"Statement":{"Resource":"*"}}}"#);
        assert_eq!(out.kind(), OutcomeKind::Malformed);
    }

    #[test]
    fn non_object_statement_stops_scan_as_safe() {
        let out = lenient(r#"{"PolicyDocument":{"Statement":[{"Resource":"a"}, 7, {"Resource":"*"}]}}"#);
        assert!(matches!(out, Outcome::Safe { omission: Some(Omission::NonObjectStatement { index: 1 }) }));
    }

    #[test]
    fn non_string_or_pattern_resources_do_not_match() {
        for resource in [json!(123), json!(["*"]), json!("arn:aws:s3:::*"), json!(" *"), json!(null)] {
            let doc = json!({"PolicyDocument": {"Statement": [{"Resource": resource}]}});
            assert_eq!(Scanner::default().scan_value(&doc).kind(), OutcomeKind::Safe);
        }
    }

    #[test]
    fn empty_statement_list_is_clean() {
        assert!(matches!(lenient(r#"{"PolicyDocument":{"Statement":[]}}"#), Outcome::Safe { omission: None }));
    }

    #[test]
    fn invalid_json_is_malformed_never_unsafe() {
        for text in ["", "{", r#"{"PolicyDocument":{"Statement":[{"Resource":"*"}]}"#, "not json"] {
            assert!(matches!(lenient(text), Outcome::Malformed(ScanError::Parse(_))), "input: {:?}", text);
        }
    }

    #[test]
    fn strict_mode_rejects_omissions_but_not_findings() {
        let strict = Scanner::new(true);
        assert!(matches!(
            strict.scan(r#"{"PolicyDocument":{}}"#),
            Outcome::Malformed(ScanError::Omitted(Omission::MissingStatement))
        ));
        assert!(matches!(
            strict.scan(r#"{"PolicyDocument":{"Statement":["x"]}}"#),
            Outcome::Malformed(ScanError::Omitted(Omission::NonObjectStatement { index: 0 }))
        ));
        assert!(matches!(strict.scan(r#"{"PolicyDocument":{"Statement":[{"Resource":"*"}]}}"#), Outcome::Unsafe { .. }));
        assert!(matches!(strict.scan(r#"{"PolicyDocument":{"Statement":[]}}"#), Outcome::Safe { omission: None }));
    }

    #[test]
    fn from_config_carries_strictness() {
        assert!(Scanner::from_config(&ScanConfig { strict: true }).strict);
        assert!(!Scanner::from_config(&ScanConfig::default()).strict);
    }

    #[test]
    fn scan_file_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{"PolicyDocument":{"Statement":[{"Resource":"*"}]}}"#).unwrap();
        assert!(matches!(Scanner::default().scan_file(&path), Outcome::Unsafe { statement: 0 }));

        let missing = dir.path().join("absent.json");
        match Scanner::default().scan_file(&missing) {
            Outcome::Malformed(ScanError::NotFound(p)) => assert_eq!(p, missing),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn scan_file_on_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Scanner::default().scan_file(dir.path()), Outcome::Malformed(ScanError::Io { .. })));
    }
}
