//! Built-in rule tables.
//!
//! Order is load-bearing: the first rule whose any keyword appears in the
//! record text wins. Reordering changes classifications for records that
//! match more than one rule.

use super::{Category, CategoryRule, SubCategoryRule};

/// Primary category rules, evaluated top to bottom.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        keywords: &[
            "dex",
            "amm",
            "swap",
            "exchange",
            "orderbook",
            "order book",
            "liquidity pool",
            "concentrated liquidity",
            "concentrated-liquidity",
        ],
        category: Category::Exchange,
    },
    CategoryRule {
        keywords: &[
            "nft",
            "collectible",
            "metaplex",
            "candy machine",
            "candy-machine",
            "compressed nft",
        ],
        category: Category::CollectibleToken,
    },
    CategoryRule {
        keywords: &["lending", "borrow", "loan", "collateral", "liquidation"],
        category: Category::Lending,
    },
    CategoryRule {
        keywords: &["staking", "stake pool", "validator", "delegation", "restaking"],
        category: Category::Staking,
    },
    CategoryRule {
        keywords: &["governance", "dao", "voting", "proposal", "multisig"],
        category: Category::Governance,
    },
    CategoryRule {
        keywords: &[
            "trading bot",
            "arbitrage",
            "market making",
            "market-making",
            "copy trading",
            "mev",
        ],
        category: Category::AutomatedTrading,
    },
    CategoryRule {
        keywords: &[
            "defi",
            "yield",
            "vault",
            "escrow",
            "vesting",
            "payment",
            "payroll",
            "stablecoin",
        ],
        category: Category::GeneralFinance,
    },
    // No explicit Infrastructure rule: it is the fallback.
];

/// Sub-category rules, evaluated top to bottom. Ecosystem project names come
/// before structural keywords so "raydium amm" labels as Raydium, not AMM.
pub const SUB_CATEGORY_RULES: &[SubCategoryRule] = &[
    // Ecosystem projects
    SubCategoryRule { keywords: &["raydium"], label: "Raydium" },
    SubCategoryRule { keywords: &["orca", "whirlpool"], label: "Orca" },
    SubCategoryRule { keywords: &["serum", "openbook"], label: "OpenBook" },
    SubCategoryRule { keywords: &["jupiter"], label: "Jupiter" },
    SubCategoryRule { keywords: &["meteora"], label: "Meteora" },
    SubCategoryRule { keywords: &["phoenix"], label: "Phoenix" },
    SubCategoryRule { keywords: &["drift"], label: "Drift" },
    SubCategoryRule { keywords: &["mango"], label: "Mango" },
    SubCategoryRule { keywords: &["marinade"], label: "Marinade" },
    SubCategoryRule { keywords: &["metaplex"], label: "Metaplex" },
    SubCategoryRule { keywords: &["squads"], label: "Squads" },
    SubCategoryRule { keywords: &["pyth"], label: "Pyth" },
    SubCategoryRule { keywords: &["switchboard"], label: "Switchboard" },
    SubCategoryRule { keywords: &["wormhole"], label: "Wormhole" },
    // Structural keywords
    SubCategoryRule {
        keywords: &["concentrated liquidity", "concentrated-liquidity", "clmm", "amm"],
        label: "AMM",
    },
    SubCategoryRule {
        keywords: &["orderbook", "order book", "clob"],
        label: "Orderbook",
    },
    SubCategoryRule { keywords: &["aggregator"], label: "Aggregator" },
    SubCategoryRule { keywords: &["perpetual", "perps"], label: "Perpetuals" },
    SubCategoryRule { keywords: &["marketplace"], label: "Marketplace" },
    SubCategoryRule {
        keywords: &["candy machine", "candy-machine"],
        label: "Candy Machine",
    },
    SubCategoryRule {
        keywords: &["lending", "borrow", "money market"],
        label: "Lending Market",
    },
    SubCategoryRule {
        keywords: &["liquid staking", "stake pool"],
        label: "Liquid Staking",
    },
    SubCategoryRule { keywords: &["validator"], label: "Validator Tooling" },
    SubCategoryRule { keywords: &["multisig"], label: "Multisig" },
    SubCategoryRule { keywords: &["dao "], label: "DAO" },
    SubCategoryRule { keywords: &["oracle"], label: "Oracle" },
    SubCategoryRule { keywords: &["bridge"], label: "Bridge" },
    SubCategoryRule { keywords: &["wallet"], label: "Wallet" },
    SubCategoryRule { keywords: &["escrow"], label: "Escrow" },
    SubCategoryRule { keywords: &["vesting"], label: "Vesting" },
    SubCategoryRule { keywords: &["faucet"], label: "Faucet" },
    SubCategoryRule { keywords: &["indexer", "indexing"], label: "Indexer" },
    SubCategoryRule {
        keywords: &["sdk", "client library", "api client"],
        label: "SDK",
    },
    SubCategoryRule { keywords: &["framework"], label: "Framework" },
    SubCategoryRule {
        keywords: &["example", "tutorial", "bootcamp", "starter"],
        label: "Examples",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_empty_keyword_sets() {
        for rule in CATEGORY_RULES {
            assert!(!rule.keywords.is_empty());
        }
        for rule in SUB_CATEGORY_RULES {
            assert!(!rule.keywords.is_empty());
        }
    }

    #[test]
    fn test_keywords_are_lowercase() {
        // Matching lowercases the record text only, so rule keywords must
        // already be lowercase or they can never match.
        for rule in CATEGORY_RULES {
            for kw in rule.keywords {
                assert_eq!(*kw, kw.to_lowercase(), "keyword not lowercase: {}", kw);
            }
        }
        for rule in SUB_CATEGORY_RULES {
            for kw in rule.keywords {
                assert_eq!(*kw, kw.to_lowercase(), "keyword not lowercase: {}", kw);
            }
        }
    }

    #[test]
    fn test_ecosystem_rules_precede_structural() {
        let raydium = SUB_CATEGORY_RULES
            .iter()
            .position(|r| r.label == "Raydium")
            .unwrap();
        let amm = SUB_CATEGORY_RULES
            .iter()
            .position(|r| r.label == "AMM")
            .unwrap();
        assert!(raydium < amm);
    }
}
