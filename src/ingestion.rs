use crate::error::{AnalyticsError, Result};
use crate::schema::{Transaction, UserId};
use crate::utils::{parse_amount_text, parse_document_date};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const FALLBACK_CATEGORY: &str = "Other";

/// Fields read off one receipt or invoice by the recognition service,
/// before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedDocument {
    #[schemars(description = "Seller, carrier or merchant name as recognised")]
    pub merchant_name: Option<String>,

    #[schemars(description = "Line item or service description, e.g. 'Taxi fare'")]
    pub item_name: Option<String>,

    #[schemars(description = "Raw amount text, may include currency signs or unit suffixes")]
    pub amount_text: Option<String>,

    #[schemars(description = "Raw date text in any of the supported receipt formats")]
    pub date: Option<String>,

    #[schemars(description = "Category assigned by the recognition service, if any")]
    pub category: Option<String>,
}

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Dining",
        &["餐饮", "美食", "星巴克", "restaurant", "cafe", "coffee", "starbucks", "dining"],
    ),
    (
        "Transport",
        &["交通", "车", "航", "油", "taxi", "railway", "airline", "fuel", "transport"],
    ),
    (
        "Office Supplies",
        &["办公", "纸", "笔", "office", "paper", "stationery"],
    ),
    (
        "Telecom",
        &["通信", "网", "信", "telecom", "mobile", "internet"],
    ),
    (
        "Electronics",
        &["电子", "电脑", "手机", "electronics", "computer", "phone"],
    ),
];

/// Guesses a category from the item and merchant text.
///
/// Keyword groups are checked in a fixed order; the first group with any
/// match wins.
pub fn infer_category(item_name: Option<&str>, merchant_name: Option<&str>) -> &'static str {
    let text = format!(
        "{}{}",
        item_name.unwrap_or_default(),
        merchant_name.unwrap_or_default()
    )
    .to_lowercase();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(FALLBACK_CATEGORY)
}

impl ExtractedDocument {
    /// Validates the recognised fields and produces the transaction owned by `user_id`.
    pub fn into_transaction(self, user_id: UserId) -> Result<Transaction> {
        let merchant = self
            .merchant_name
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AnalyticsError::MissingField("merchant_name".to_string()))?
            .to_string();

        let raw_date = self
            .date
            .as_deref()
            .ok_or_else(|| AnalyticsError::MissingField("date".to_string()))?;
        let date = parse_document_date(raw_date)?;

        let amount = self
            .amount_text
            .as_deref()
            .and_then(parse_amount_text)
            .unwrap_or(0.0);

        let category = match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() && c != FALLBACK_CATEGORY => c.to_string(),
            _ => {
                let inferred = infer_category(self.item_name.as_deref(), Some(&merchant));
                debug!("Inferred category '{}' for merchant '{}'", inferred, merchant);
                inferred.to_string()
            }
        };

        Ok(Transaction {
            amount,
            category,
            merchant,
            date,
            user_id,
        })
    }
}
