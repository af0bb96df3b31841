use std::fmt;

/// Filters for `GET /r/orders`.
///
/// The provider takes these as `;`-separated matrix parameters rather than an
/// `&`-separated query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub include_inactive: bool,
    pub server_type: Option<String>,
    pub meta_search: Option<MetaSearch>,
    pub order_oids: Option<u64>,
}

impl OrderQuery {
    /// Active VPS orders, the starting point for most lookups.
    pub fn active_vps() -> Self {
        Self {
            server_type: Some("VPS".into()),
            ..Default::default()
        }
    }

    pub fn include_inactive(mut self, yes: bool) -> Self {
        self.include_inactive = yes;
        self
    }

    pub fn meta_search(mut self, search: MetaSearch) -> Self {
        self.meta_search = Some(search);
        self
    }

    pub fn order_oid(mut self, order_oid: u64) -> Self {
        self.order_oids = Some(order_oid);
        self
    }

    /// Request path including the encoded filters.
    pub fn to_path(&self) -> String {
        let mut params: Vec<(&str, String)> = vec![(
            "include_inactive",
            if self.include_inactive { "Y" } else { "N" }.to_string(),
        )];
        if let Some(t) = &self.server_type {
            params.push(("server_type", t.clone()));
        }
        if let Some(search) = &self.meta_search {
            params.push(("meta_search", search.to_string()));
        }
        if let Some(oid) = self.order_oids {
            params.push(("order_oids", oid.to_string()));
        }

        let encoded = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join(";");

        format!("/r/orders;{encoded}")
    }
}

/// A free-text metadata search: space-separated `key:value` terms, all of
/// which must match. An empty value matches any order carrying the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaSearch {
    terms: Vec<(String, String)>,
}

impl MetaSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a tag `key` with exactly `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push((key.into(), value.into()));
        self
    }

    /// Require a tag `key` with any value.
    pub fn with_key(self, key: impl Into<String>) -> Self {
        self.with(key, "")
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse the wire form back into terms. Tokens without a `:` are kept as
    /// key-only terms.
    pub fn parse(expr: &str) -> Self {
        let terms = expr
            .split_whitespace()
            .map(|term| match term.split_once(':') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (term.to_string(), String::new()),
            })
            .collect();
        Self { terms }
    }
}

impl fmt::Display for MetaSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{k}:{v}")?;
        }
        Ok(())
    }
}
