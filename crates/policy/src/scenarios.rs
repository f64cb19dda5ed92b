//! Built-in scenario suite, run by `iamscan --run_unit_tests`.

use crate::Scanner;
use iamscan_core::{Outcome, OutcomeKind};

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub input: &'static str,
    pub strict: bool,
    pub expected: OutcomeKind,
}

#[derive(Debug)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub expected: OutcomeKind,
    pub outcome: Outcome,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool { self.outcome.kind() == self.expected }
}

const fn lenient(name: &'static str, input: &'static str, expected: OutcomeKind) -> Scenario {
    Scenario { name, input, strict: false, expected }
}

const fn strict(name: &'static str, input: &'static str, expected: OutcomeKind) -> Scenario {
    Scenario { name, input, strict: true, expected }
}

const SPECIFIC_RESOURCE: &str = r#"
{
    "PolicyDocument": {
        "Statement": [
            {
                "Resource": "arn:aws:s3:::example-bucket",
                "Effect": "Allow",
                "Action": "s3:GetObject"
            }
        ]
    }
}"#;

const WILDCARD_RESOURCE: &str = r#"
{
    "PolicyName": "root",
    "PolicyDocument": {
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "IamListAccess",
            "Effect": "Allow",
            "Action": ["iam:ListRoles", "iam:ListUsers"],
            "Resource": "*"
        }]
    }
}"#;

const SECOND_STATEMENT_WILDCARD: &str = r#"
{
    "PolicyDocument": {
        "Statement": [
            {"Effect": "Allow", "Action": "s3:GetObject", "Resource": "arn:aws:s3:::example-bucket/*"},
            {"Effect": "Allow", "Action": "ec2:DescribeInstances", "Resource": "*"},
            42
        ]
    }
}"#;

pub fn builtin() -> Vec<Scenario> {
    use OutcomeKind::*;
    vec![
        lenient("specific_resource", SPECIFIC_RESOURCE, Safe),
        lenient("missing_policy_document_key", r#"{"Statement": []}"#, Safe),
        lenient("non_object_policy_document", r#"{"PolicyDocument": "not_a_dict", "Statement": []}"#, Safe),
        lenient("missing_statement_key", r#"{"PolicyDocument": {}}"#, Safe),
        lenient("non_list_statement", r#"{"PolicyDocument": {"Statement": "not_a_list"}}"#, Malformed),
        lenient("numeric_resource", r#"{"PolicyDocument": {"Statement": [{"Resource": 123}]}}"#, Safe),
        lenient("wildcard_resource", WILDCARD_RESOURCE, Unsafe),
        lenient("wildcard_in_second_statement", SECOND_STATEMENT_WILDCARD, Unsafe),
        lenient("non_object_statement", r#"{"PolicyDocument": {"Statement": ["s3:*"]}}"#, Safe),
        lenient("arn_pattern_resource", r#"{"PolicyDocument": {"Statement": [{"Resource": "arn:aws:s3:::*"}]}}"#, Safe),
        lenient("invalid_json", r#"{"PolicyDocument": {"Statement": [{"Resource": "*"}"#, Malformed),
        strict("strict_missing_statement_key", r#"{"PolicyDocument": {}}"#, Malformed),
        strict("strict_non_object_statement", r#"{"PolicyDocument": {"Statement": [null]}}"#, Malformed),
        strict("strict_wildcard_resource", WILDCARD_RESOURCE, Unsafe),
    ]
}

/// Runs every built-in scenario with its own scanner settings.
pub fn run() -> Vec<ScenarioResult> {
    builtin()
        .into_iter()
        .map(|s| ScenarioResult {
            name: s.name,
            expected: s.expected,
            outcome: Scanner::new(s.strict).scan(s.input),
        })
        .collect()
}
