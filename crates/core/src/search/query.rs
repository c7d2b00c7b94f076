//! Query-parameter codec for deep links and history entries.

use crate::services::search::SearchMode;

/// Recognized query parameters: `query`, `discount`, `recommended`,
/// `from`, `category_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    /// Free-text query.
    pub query: String,
    /// Discount mode requested.
    pub discount: bool,
    /// Recommended mode requested.
    pub recommended: bool,
    /// Set when navigation carried `from=main`, i.e. the user arrived from
    /// the home page.
    pub from_main: bool,
    /// Category ids carried by the link.
    pub category_ids: Vec<u64>,
}

impl QueryParams {
    /// Parse an encoded query string. Unknown keys are ignored; malformed
    /// category ids are skipped rather than failing the whole parse.
    pub fn parse(raw: &str) -> Self {
        let mut params = QueryParams::default();
        for pair in raw.trim_start_matches('?').split('&') {
            let mut parts = pair.splitn(2, '=');
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            let value = urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string());
            match key {
                "query" => params.query = value,
                "discount" => params.discount = value == "true",
                "recommended" => params.recommended = value == "true",
                "from" => params.from_main = value == "main",
                "category_ids" => {
                    params.category_ids = value
                        .split(',')
                        .filter_map(|id| id.trim().parse().ok())
                        .collect();
                }
                _ => {}
            }
        }
        params
    }

    /// Encode for a history entry or a shareable link. Default members are
    /// omitted; `from` is never re-emitted (it marks arrival, not state).
    pub fn encode(&self) -> String {
        let mut pairs: Vec<String> = Vec::new();
        if !self.query.is_empty() {
            pairs.push(format!("query={}", urlencoding::encode(&self.query)));
        }
        if self.discount {
            pairs.push("discount=true".to_string());
        }
        if self.recommended {
            pairs.push("recommended=true".to_string());
        }
        if !self.category_ids.is_empty() {
            let joined = self
                .category_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(format!("category_ids={joined}"));
        }
        pairs.join("&")
    }

    /// Mode implied by the discount/recommended flags. Discount wins if a
    /// malformed link sets both.
    pub fn mode(&self) -> SearchMode {
        if self.discount {
            SearchMode::Discounted
        } else if self.recommended {
            SearchMode::Recommended
        } else {
            SearchMode::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_link() {
        let params =
            QueryParams::parse("query=zelda%20botw&discount=true&from=main&category_ids=1,4,9");
        assert_eq!(params.query, "zelda botw");
        assert!(params.discount);
        assert!(!params.recommended);
        assert!(params.from_main);
        assert_eq!(params.category_ids, vec![1, 4, 9]);
        assert_eq!(params.mode(), SearchMode::Discounted);
    }

    #[test]
    fn parse_ignores_unknown_and_malformed() {
        let params = QueryParams::parse("?query=mario&unknown=1&category_ids=2,x,5&flag");
        assert_eq!(params.query, "mario");
        assert_eq!(params.category_ids, vec![2, 5]);
    }

    #[test]
    fn encode_round_trips_without_from() {
        let params = QueryParams {
            query: "dark souls".to_string(),
            recommended: true,
            category_ids: vec![7],
            from_main: true,
            ..Default::default()
        };
        let encoded = params.encode();
        assert!(!encoded.contains("from="));
        let reparsed = QueryParams::parse(&encoded);
        assert_eq!(reparsed.query, "dark souls");
        assert!(reparsed.recommended);
        assert_eq!(reparsed.category_ids, vec![7]);
        assert!(!reparsed.from_main);
    }

    #[test]
    fn empty_params_encode_empty() {
        assert_eq!(QueryParams::default().encode(), "");
    }
}
