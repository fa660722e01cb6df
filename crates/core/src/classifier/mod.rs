//! Keyword-based classification of program repositories.
//!
//! A record's name, description and topics are flattened into one lowercase
//! string and matched against an ordered rule list. The first rule with any
//! matching substring wins; records matching nothing land in the default
//! category. Ordering is the only tie-break, so the rule tables are data
//! (`rules.rs`) behind the [`Classifier`] trait and can be swapped without
//! touching callers.

mod rules;

pub use rules::{CATEGORY_RULES, SUB_CATEGORY_RULES};

use serde::{Deserialize, Serialize};

/// Closed set of primary categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Exchange,
    CollectibleToken,
    Lending,
    Staking,
    GeneralFinance,
    Governance,
    AutomatedTrading,
    Infrastructure,
}

impl Category {
    /// Stable identifier used in persisted rows and query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Exchange => "exchange",
            Category::CollectibleToken => "collectible_token",
            Category::Lending => "lending",
            Category::Staking => "staking",
            Category::GeneralFinance => "general_finance",
            Category::Governance => "governance",
            Category::AutomatedTrading => "automated_trading",
            Category::Infrastructure => "infrastructure",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Exchange => "Exchange",
            Category::CollectibleToken => "Collectible Token",
            Category::Lending => "Lending",
            Category::Staking => "Staking",
            Category::GeneralFinance => "General Finance",
            Category::Governance => "Governance",
            Category::AutomatedTrading => "Automated Trading",
            Category::Infrastructure => "Infrastructure",
        }
    }

    /// Parse the stable identifier back into a category.
    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "exchange" => Some(Category::Exchange),
            "collectible_token" => Some(Category::CollectibleToken),
            "lending" => Some(Category::Lending),
            "staking" => Some(Category::Staking),
            "general_finance" => Some(Category::GeneralFinance),
            "governance" => Some(Category::Governance),
            "automated_trading" => Some(Category::AutomatedTrading),
            "infrastructure" => Some(Category::Infrastructure),
            _ => None,
        }
    }

    /// Default category for records matching no rule.
    pub fn default_category() -> Category {
        Category::Infrastructure
    }
}

/// Result of classifying one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    /// Free-form sub-category. Falls back to the primary category's label
    /// when no sub-category rule matches.
    pub sub_category: String,
}

/// A single category rule: any matching keyword assigns the category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub keywords: &'static [&'static str],
    pub category: Category,
}

/// A single sub-category rule.
#[derive(Debug, Clone, Copy)]
pub struct SubCategoryRule {
    pub keywords: &'static [&'static str],
    pub label: &'static str,
}

/// Trait for classifiers so the rule tables can be swapped behind one seam.
pub trait Classifier: Send + Sync {
    /// Classify a record. Total over any input; never errors.
    fn classify(&self, name: &str, description: Option<&str>, topics: &[String])
        -> Classification;
}

/// Ordered-rule-list classifier. First matching rule wins.
pub struct RuleClassifier {
    category_rules: &'static [CategoryRule],
    sub_category_rules: &'static [SubCategoryRule],
}

impl RuleClassifier {
    /// Classifier over the built-in rule tables.
    pub fn new() -> Self {
        Self {
            category_rules: CATEGORY_RULES,
            sub_category_rules: SUB_CATEGORY_RULES,
        }
    }

    /// Classifier over custom rule tables.
    pub fn with_rules(
        category_rules: &'static [CategoryRule],
        sub_category_rules: &'static [SubCategoryRule],
    ) -> Self {
        Self {
            category_rules,
            sub_category_rules,
        }
    }

    fn haystack(name: &str, description: Option<&str>, topics: &[String]) -> String {
        let mut text = String::with_capacity(
            name.len() + description.map(str::len).unwrap_or(0) + topics.len() * 16,
        );
        text.push_str(name);
        if let Some(desc) = description {
            text.push(' ');
            text.push_str(desc);
        }
        for topic in topics {
            text.push(' ');
            text.push_str(topic);
        }
        text.to_lowercase()
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for RuleClassifier {
    fn classify(
        &self,
        name: &str,
        description: Option<&str>,
        topics: &[String],
    ) -> Classification {
        let text = Self::haystack(name, description, topics);

        let category = self
            .category_rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| text.contains(kw)))
            .map(|rule| rule.category)
            .unwrap_or_else(Category::default_category);

        let sub_category = self
            .sub_category_rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| text.contains(kw)))
            .map(|rule| rule.label.to_string())
            .unwrap_or_else(|| category.label().to_string());

        Classification {
            category,
            sub_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(name: &str, description: &str, topics: &[&str]) -> Classification {
        let topics: Vec<String> = topics.iter().map(|t| t.to_string()).collect();
        RuleClassifier::new().classify(name, Some(description), &topics)
    }

    #[test]
    fn test_amm_description_is_exchange() {
        let c = classify(
            "liquidity-pool",
            "A concentrated-liquidity AMM on Solana",
            &[],
        );
        assert_eq!(c.category, Category::Exchange);
        assert_eq!(c.sub_category, "AMM");
    }

    #[test]
    fn test_no_match_falls_back_to_infrastructure() {
        let c = classify("mystery-repo", "does something", &[]);
        assert_eq!(c.category, Category::Infrastructure);
        // Sub-category mirrors the primary label when no sub rule matches.
        assert_eq!(c.sub_category, "Infrastructure");
    }

    #[test]
    fn test_topics_participate_in_matching() {
        let c = classify("some-repo", "programs for a chain", &["nft", "rust"]);
        assert_eq!(c.category, Category::CollectibleToken);
    }

    #[test]
    fn test_first_rule_wins_on_multiple_matches() {
        // Matches both Exchange ("dex") and Staking ("staking"); Exchange is
        // earlier in the rule list.
        let c = classify("dex-staking", "staking rewards for dex LPs", &[]);
        assert_eq!(c.category, Category::Exchange);
    }

    #[test]
    fn test_case_insensitive() {
        let upper = classify("LENDING-PROTOCOL", "BORROW AND LEND", &[]);
        let lower = classify("lending-protocol", "borrow and lend", &[]);
        assert_eq!(upper.category, Category::Lending);
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_deterministic() {
        let a = classify("jupiter-core", "swap aggregator", &["defi"]);
        let b = classify("jupiter-core", "swap aggregator", &["defi"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_none_description() {
        let c = RuleClassifier::new().classify("governance-ui", None, &[]);
        assert_eq!(c.category, Category::Governance);
    }

    #[test]
    fn test_ecosystem_name_sub_category() {
        let c = classify("raydium-clmm", "concentrated liquidity market maker", &[]);
        assert_eq!(c.category, Category::Exchange);
        assert_eq!(c.sub_category, "Raydium");
    }

    #[test]
    fn test_category_parse_round_trip() {
        for cat in [
            Category::Exchange,
            Category::CollectibleToken,
            Category::Lending,
            Category::Staking,
            Category::GeneralFinance,
            Category::Governance,
            Category::AutomatedTrading,
            Category::Infrastructure,
        ] {
            assert_eq!(Category::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(Category::parse("bogus"), None);
    }

    #[test]
    fn test_category_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&Category::CollectibleToken).unwrap(),
            "\"collectible_token\""
        );
        let parsed: Category = serde_json::from_str("\"automated_trading\"").unwrap();
        assert_eq!(parsed, Category::AutomatedTrading);
    }
}
