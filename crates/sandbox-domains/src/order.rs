//! Helpers shared by the domain generators
//!
//! Generators read loosely-typed protocol JSON. Everything here treats a
//! missing key and an explicit `null` the same way.

use chrono::{Duration, SecondsFormat, Utc};
use serde_json::{json, Value};

/// JSON-LD context of the core v2 schema (main branch)
pub const CORE_CONTEXT: &str =
    "https://raw.githubusercontent.com/beckn/protocol-specifications-new/refs/heads/main/schema/core/v2/context.jsonld";

/// JSON-LD context of the core v2 schema (draft branch)
pub const DRAFT_CORE_CONTEXT: &str =
    "https://raw.githubusercontent.com/beckn/protocol-specifications-new/refs/heads/draft/schema/core/v2/context.jsonld";

/// Value at `pointer` below `value`; `null` counts as absent
pub fn at<'a>(value: Option<&'a Value>, pointer: &str) -> Option<&'a Value> {
    value
        .and_then(|v| v.pointer(pointer))
        .filter(|v| !v.is_null())
}

/// First present candidate, cloned, or `fallback`
pub fn first_or(candidates: &[Option<&Value>], fallback: Value) -> Value {
    candidates
        .iter()
        .find_map(|candidate| *candidate)
        .cloned()
        .unwrap_or(fallback)
}

/// First present candidate, cloned, or `null`
pub fn first_present(candidates: &[Option<&Value>]) -> Value {
    first_or(candidates, Value::Null)
}

/// Positive number at `pointer`
pub fn number_at(value: Option<&Value>, pointer: &str) -> Option<f64> {
    at(value, pointer).and_then(Value::as_f64).filter(|n| *n > 0.0)
}

/// String at `pointer`
pub fn str_at<'a>(value: Option<&'a Value>, pointer: &str) -> Option<&'a str> {
    at(value, pointer).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current time in RFC 3339
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Time `offset` from now in RFC 3339
pub fn timestamp_in(offset: Duration) -> String {
    (Utc::now() + offset).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Last `n` digits of the current epoch millis
pub fn millis_suffix(n: usize) -> String {
    let millis = now_millis().to_string();
    millis[millis.len().saturating_sub(n)..].to_string()
}

/// Entry of `list` whose `beckn:id` equals `id`, else the first entry
pub fn find_by_id<'a>(list: Option<&'a Value>, id: Option<&Value>) -> Option<&'a Value> {
    let entries = list?.as_array()?;
    id.and_then(|id| entries.iter().find(|entry| entry.get("beckn:id") == Some(id)))
        .or_else(|| entries.first())
}

/// Offer of `offers` listing `item_id` under `beckn:items`, else the first offer
pub fn find_offer_for_item<'a>(offers: Option<&'a Value>, item_id: Option<&Value>) -> Option<&'a Value> {
    let entries = offers?.as_array()?;
    item_id
        .and_then(|id| {
            entries.iter().find(|offer| {
                offer
                    .get("beckn:items")
                    .and_then(Value::as_array)
                    .map(|items| items.contains(id))
                    .unwrap_or(false)
            })
        })
        .or_else(|| entries.first())
}

/// Order items from the request, else from the prior order, else empty
pub fn carried_items(request: Option<&Value>, prior: Option<&Value>) -> Value {
    first_or(
        &[at(request, "/beckn:orderItems"), at(prior, "/beckn:orderItems")],
        json!([]),
    )
}

/// One line of a computed quote
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLine {
    /// Component type (`UNIT`, `FEE`, `TAX`, ...)
    pub kind: &'static str,
    /// Signed amount
    pub value: f64,
    /// Human-readable description
    pub description: String,
}

impl PriceLine {
    /// Create a line, rounding the amount to cents
    pub fn new(kind: &'static str, value: f64, description: impl Into<String>) -> Self {
        Self {
            kind,
            value: round2(value),
            description: description.into(),
        }
    }
}

/// Order value computed on select
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// ISO currency code
    pub currency: String,
    /// Sum of all lines, rounded to cents
    pub total: f64,
    /// Component lines
    pub lines: Vec<PriceLine>,
}

impl Quote {
    /// Build a quote whose total is the sum of its lines
    pub fn from_lines(currency: impl Into<String>, lines: Vec<PriceLine>) -> Self {
        let total = round2(lines.iter().map(|line| line.value).sum());
        Self {
            currency: currency.into(),
            total,
            lines,
        }
    }

    /// `schema:PriceSpecification` with `beckn:` prefixed components
    pub fn to_price_specification(&self) -> Value {
        let components: Vec<Value> = self
            .lines
            .iter()
            .map(|line| {
                json!({
                    "@type": "beckn:PriceComponent",
                    "beckn:type": line.kind,
                    "beckn:value": line.value,
                    "beckn:currency": self.currency,
                    "beckn:description": line.description,
                })
            })
            .collect();
        price_specification(&self.currency, self.total, components)
    }

    /// Plain `{currency, value, components}` form
    pub fn to_plain_value(&self) -> Value {
        let components: Vec<Value> = self
            .lines
            .iter()
            .map(|line| {
                json!({
                    "type": line.kind,
                    "value": line.value,
                    "currency": self.currency,
                    "description": line.description,
                })
            })
            .collect();
        json!({
            "currency": self.currency,
            "value": self.total,
            "components": components,
        })
    }
}

/// `schema:PriceSpecification` in the draft context
pub fn price_specification(currency: &str, price: f64, components: Vec<Value>) -> Value {
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "schema:PriceSpecification",
        "schema:priceCurrency": currency,
        "schema:price": round2(price),
        "beckn:components": components,
    })
}

/// Total of an order's `beckn:orderValue`, in either price form
pub fn order_total(order: Option<&Value>) -> Option<f64> {
    number_at(order, "/beckn:orderValue/schema:price").or_else(|| number_at(order, "/beckn:orderValue/value"))
}

/// Currency of an order's `beckn:orderValue`, in either price form
pub fn order_currency(order: Option<&Value>) -> Option<&str> {
    str_at(order, "/beckn:orderValue/schema:priceCurrency").or_else(|| str_at(order, "/beckn:orderValue/currency"))
}

/// Copy the members of `extra` into `target`, overwriting existing keys.
/// Non-object values are left untouched.
pub fn merge(target: &mut Value, extra: &Value) {
    if let (Some(target), Some(fields)) = (target.as_object_mut(), extra.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Drop `null` members so absent optional fields are omitted
pub fn compact(mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        map.retain(|_, v| !v.is_null());
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_treats_null_as_absent() {
        let order = json!({ "beckn:buyer": null, "beckn:id": "o-1" });
        assert!(at(Some(&order), "/beckn:buyer").is_none());
        assert_eq!(at(Some(&order), "/beckn:id"), Some(&json!("o-1")));
        assert!(at(None, "/beckn:id").is_none());
    }

    #[test]
    fn test_first_or_skips_missing() {
        let a = json!("from-prior");
        assert_eq!(first_or(&[None, Some(&a)], json!("default")), a);
        assert_eq!(first_or(&[None, None], json!("default")), json!("default"));
    }

    #[test]
    fn test_catalog_lookup_falls_back_to_first() {
        let items = json!([{ "beckn:id": "a" }, { "beckn:id": "b" }]);
        assert_eq!(find_by_id(Some(&items), Some(&json!("b"))).unwrap()["beckn:id"], "b");
        assert_eq!(find_by_id(Some(&items), Some(&json!("zz"))).unwrap()["beckn:id"], "a");
        assert!(find_by_id(None, None).is_none());

        let offers = json!([
            { "beckn:id": "o1", "beckn:items": ["a"] },
            { "beckn:id": "o2", "beckn:items": ["b", "c"] }
        ]);
        assert_eq!(find_offer_for_item(Some(&offers), Some(&json!("c"))).unwrap()["beckn:id"], "o2");
        assert_eq!(find_offer_for_item(Some(&offers), None).unwrap()["beckn:id"], "o1");
    }

    #[test]
    fn test_quote_totals_lines() {
        let quote = Quote::from_lines(
            "USD",
            vec![PriceLine::new("UNIT", 18.0, "Base fare"), PriceLine::new("TAX", 0.5004, "Tax")],
        );
        assert_eq!(quote.total, 18.5);

        let spec = quote.to_price_specification();
        assert_eq!(spec["schema:price"], 18.5);
        assert_eq!(spec["beckn:components"][1]["beckn:value"], 0.5);

        let plain = quote.to_plain_value();
        assert_eq!(plain["value"], 18.5);
        assert_eq!(plain["components"][0]["type"], "UNIT");
    }

    #[test]
    fn test_order_total_reads_both_forms() {
        let schema = json!({ "beckn:orderValue": { "schema:price": 752.25, "schema:priceCurrency": "USD" } });
        let plain = json!({ "beckn:orderValue": { "value": 128.64, "currency": "INR" } });
        assert_eq!(order_total(Some(&schema)), Some(752.25));
        assert_eq!(order_currency(Some(&plain)), Some("INR"));
        assert_eq!(order_total(None), None);
    }

    #[test]
    fn test_merge_overwrites_keys() {
        let mut order = json!({ "a": 1, "b": 2 });
        merge(&mut order, &json!({ "b": 3, "c": 4 }));
        assert_eq!(order, json!({ "a": 1, "b": 3, "c": 4 }));
    }

    #[test]
    fn test_compact_drops_nulls() {
        let value = compact(json!({ "a": 1, "b": null }));
        assert_eq!(value, json!({ "a": 1 }));
    }
}
