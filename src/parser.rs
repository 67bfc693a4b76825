use regex::Regex;

use crate::error::ParseError;
use crate::llm::LlmClient;
use crate::models::{Category, StructuredReceipt};

/// Model backends in fallback order, strongest first. A backend that
/// errors, returns no JSON, or returns JSON that fails the schema just
/// hands off to the next one; that churn is the normal case, not the
/// exception.
const MODELS: &[&str] = &["gpt-4-turbo", "gpt-3.5-turbo"];

/// A successful parse, tagged with the backend that produced it so the
/// run log can say which model did the work.
#[derive(Debug)]
pub struct Parsed {
    pub receipt: StructuredReceipt,
    pub model: String,
}

pub struct StructuredParser {
    client: Box<dyn LlmClient>,
    models: Vec<String>,
}

impl StructuredParser {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self {
            client,
            models: MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[cfg(test)]
    pub fn with_models(client: Box<dyn LlmClient>, models: &[&str]) -> Self {
        Self {
            client,
            models: models.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Structure raw receipt text, trying each backend in order.
    pub fn parse(&self, text: &str) -> Result<Parsed, ParseError> {
        let prompt = build_prompt(text);
        let mut causes = Vec::new();

        for model in &self.models {
            match self.try_model(model, &prompt) {
                Ok(receipt) => {
                    return Ok(Parsed {
                        receipt,
                        model: model.clone(),
                    })
                }
                Err(e) => causes.push(format!("{model}: {e}")),
            }
        }

        let last = causes.last().cloned().unwrap_or_default();
        Err(ParseError::Exhausted { causes, last })
    }

    fn try_model(&self, model: &str, prompt: &str) -> Result<StructuredReceipt, ParseError> {
        let content = self.client.complete(model, prompt)?;
        let json = extract_json_object(&content).ok_or(ParseError::NoJson)?;
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ParseError::Json(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| ParseError::Schema(e.to_string()))
    }
}

/// Greedy outermost-brace match: first `{` through last `}`. Models wrap
/// the JSON in prose often enough that this cannot be an error path of
/// its own.
fn extract_json_object(text: &str) -> Option<&str> {
    let re = Regex::new(r"(?s)\{.*\}").expect("static regex");
    re.find(text).map(|m| m.as_str())
}

fn build_prompt(text: &str) -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are a precise data-extraction assistant. From the receipt text below, extract:
- Store name, convert store name to camel case
- Purchase date (YYYY-MM-DD if present)
- Total amount (numeric)
- Tax total (numeric, if present; otherwise 0)
- An itemized list of each item with:
    - Item name
    - Category (choose ONE from: {categories}; use 'Other' if none match). Assign alcohol to Entertainment.
    - Price (numeric, pre-tax if the receipt separates tax)
    - Taxable (true or false) — decide based on markings or context in the receipt text

Return ONLY valid JSON (no commentary) in this format:

{{
  "Store name": "...",
  "Purchase date": "YYYY-MM-DD",
  "Total amount": 123.45,
  "Tax total": 1.23,
  "Items": [
    {{"Item": "Bananas", "Category": "Groceries", "Price": 5.00, "Taxable": false}},
    {{"Item": "Shampoo", "Category": "Health", "Price": 9.00, "Taxable": true}}
  ]
}}

Receipt text:
"""
{text}
"""
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const GOOD_JSON: &str = r#"{
        "Store name": "TraderJoes",
        "Purchase date": "2025-11-02",
        "Total amount": 15.00,
        "Tax total": 1.00,
        "Items": [
            {"Item": "Bananas", "Category": "Groceries", "Price": 5.00, "Taxable": false},
            {"Item": "Shampoo", "Category": "Health", "Price": 9.00, "Taxable": true}
        ]
    }"#;

    /// Returns one canned response per call, in order.
    struct FakeLlm {
        responses: RefCell<Vec<Result<String, ParseError>>>,
    }

    impl FakeLlm {
        fn new(responses: Vec<Result<String, ParseError>>) -> Self {
            Self {
                responses: RefCell::new(responses),
            }
        }
    }

    impl LlmClient for FakeLlm {
        fn complete(&self, _model: &str, _prompt: &str) -> Result<String, ParseError> {
            self.responses.borrow_mut().remove(0)
        }
    }

    #[test]
    fn test_first_backend_wins_when_it_succeeds() {
        let fake = FakeLlm::new(vec![Ok(GOOD_JSON.to_string())]);
        let parser = StructuredParser::new(Box::new(fake));
        let parsed = parser.parse("receipt text").unwrap();
        assert_eq!(parsed.model, "gpt-4-turbo");
        assert_eq!(parsed.receipt.items.len(), 2);
    }

    #[test]
    fn test_second_backend_covers_a_failing_first() {
        let fake = FakeLlm::new(vec![
            Err(ParseError::Backend("rate limited".into())),
            Ok(GOOD_JSON.to_string()),
        ]);
        let parser = StructuredParser::new(Box::new(fake));
        let parsed = parser.parse("receipt text").unwrap();
        assert_eq!(parsed.model, "gpt-3.5-turbo");
        assert_eq!(parsed.receipt.store, "TraderJoes");
    }

    #[test]
    fn test_json_is_pulled_out_of_surrounding_prose() {
        let wrapped = format!("Sure! Here is the extraction:\n{GOOD_JSON}\nLet me know if it helps.");
        let fake = FakeLlm::new(vec![Ok(wrapped)]);
        let parser = StructuredParser::new(Box::new(fake));
        let parsed = parser.parse("receipt text").unwrap();
        assert_eq!(parsed.receipt.tax_total, 1.00);
    }

    #[test]
    fn test_all_backends_failing_is_terminal() {
        let fake = FakeLlm::new(vec![
            Err(ParseError::Backend("down".into())),
            Ok("no json here at all".to_string()),
        ]);
        let parser = StructuredParser::new(Box::new(fake));
        match parser.parse("receipt text") {
            Err(ParseError::Exhausted { causes, last }) => {
                assert_eq!(causes.len(), 2);
                assert!(causes[0].contains("gpt-4-turbo"));
                assert!(last.contains("No JSON object"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_syntax_and_bad_schema_are_distinct_causes() {
        let fake = FakeLlm::new(vec![
            Ok(r#"{"Store name": "#.to_string() + "}"),
            Ok(r#"{"Store name": "X", "Items": [{"Item": "A", "Category": "Groceries", "Price": "a lot"}]}"#.to_string()),
        ]);
        let parser = StructuredParser::new(Box::new(fake));
        match parser.parse("receipt text") {
            Err(ParseError::Exhausted { causes, .. }) => {
                assert!(causes[0].contains("Invalid JSON"));
                assert!(causes[1].contains("schema"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[test]
    fn test_no_partial_receipt_on_exhaustion() {
        let fake = FakeLlm::new(vec![Err(ParseError::Backend("down".into()))]);
        let parser = StructuredParser::with_models(Box::new(fake), &["only-model"]);
        assert!(parser.parse("receipt text").is_err());
    }

    #[test]
    fn test_prompt_carries_categories_and_receipt_text() {
        let prompt = build_prompt("KROGER 11/02 BANANAS 1.25");
        assert!(prompt.contains("Gifts/Charity"));
        assert!(prompt.contains("Assign alcohol to Entertainment"));
        assert!(prompt.contains("KROGER 11/02 BANANAS 1.25"));
    }

    #[test]
    fn test_extract_json_object_greedy_outermost() {
        let text = r#"prefix {"a": {"b": 1}} suffix"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": 1}}"#));
        assert_eq!(extract_json_object("no braces"), None);
    }
}
