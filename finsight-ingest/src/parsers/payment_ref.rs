//! Best-effort extraction of amount and merchant from payment reference text.
//!
//! Handles bank/UPI style strings such as:
//!   UPI/DR/412345678901/ACME STORE/HDFC/acme@okhdfc
//!   Paid Rs. 450 to Acme Store via UPI
//!   INR 1,250.00 debited from A/c XX1234 to VPA swiggy.food@axl on 12-01-25

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Whatever could be pulled out of the text; both fields may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentRef {
    pub amount: Option<f64>,
    pub merchant: Option<String>,
}

struct Patterns {
    currency_amount: Regex,
    verb_amount: Regex,
    upi_slash: Regex,
    to_phrase: Regex,
    vpa: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            currency_amount: Regex::new(r"(?i)(?:\brs\.?|\binr|₹)\s*([0-9][0-9,]*(?:\.[0-9]+)?)")?,
            verb_amount: Regex::new(
                r"(?i)\b(?:debited|paid|sent|spent|credited)\s+(?:(?:for|of|by|with)\s+)?([0-9][0-9,]*(?:\.[0-9]+)?)\b",
            )?,
            upi_slash: Regex::new(r"(?i)\bUPI/(?:DR|CR|P2M|P2A)/[^/]*/([^/]+)")?,
            to_phrase: Regex::new(concat!(
                r"(?i)\b(?:to|at)\s+",
                r"([a-z][a-z0-9&'.\- ]*?)",
                r"\s*(?:\b(?:via|on|ref|using|upi|for)\b|[,;:/(]|$)"
            ))?,
            vpa: Regex::new(r"\b([A-Za-z0-9._\-]+)@([A-Za-z]+)\b")?,
        })
    }
}

static PATTERNS: LazyLock<Result<Patterns, regex::Error>> = LazyLock::new(Patterns::compile);

fn parse_number(s: &str) -> Option<f64> {
    s.replace(',', "").parse::<f64>().ok()
}

fn clean_merchant(raw: &str) -> Option<String> {
    let name = raw
        .trim()
        .trim_end_matches('.')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if name.chars().filter(|c| c.is_alphanumeric()).count() < 2 {
        return None;
    }
    Some(name)
}

/// `swiggy.food` -> `Swiggy Food`; phone-number handles yield nothing.
fn merchant_from_handle(handle: &str) -> Option<String> {
    let words: Vec<String> = handle
        .split(['.', '_', '-'])
        .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect();
    clean_merchant(&words.join(" "))
}

fn find_amount(p: &Patterns, text: &str) -> Option<f64> {
    p.currency_amount
        .captures(text)
        .or_else(|| p.verb_amount.captures(text))
        .and_then(|caps| parse_number(&caps[1]))
}

fn find_merchant(p: &Patterns, text: &str) -> Option<String> {
    if let Some(m) = p
        .upi_slash
        .captures(text)
        .and_then(|caps| clean_merchant(&caps[1]))
    {
        return Some(m);
    }

    if let Some(m) = p
        .to_phrase
        .captures_iter(text)
        .filter_map(|caps| clean_merchant(&caps[1]))
        .find(|m| !m.eq_ignore_ascii_case("vpa"))
    {
        return Some(m);
    }

    p.vpa
        .captures(text)
        .and_then(|caps| merchant_from_handle(&caps[1]))
}

/// Parse payment-reference-like text. Never fails; no match means `None` fields.
pub fn parse_payment_reference(text: &str) -> PaymentRef {
    let Ok(p) = &*PATTERNS else {
        return PaymentRef::default();
    };
    PaymentRef {
        amount: find_amount(p, text),
        merchant: find_merchant(p, text),
    }
}
