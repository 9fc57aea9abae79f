//! Address validation and normalization.
//!
//! Addresses pass through two steps before they reach the wire: syntactic
//! validation via the `email_address` crate, then IDNA encoding of the
//! domain so relays without SMTPUTF8 support still accept internationalized
//! domains. The local part is never rewritten.

use email_address::EmailAddress;

use crate::error::MailError;

/// Validate an address and encode its domain to ASCII.
///
/// Empty input passes through unchanged (it is filtered upstream, not an
/// error here). Validation failure yields [`MailError::InvalidAddress`]
/// carrying the offending address.
///
/// # Examples
///
/// ```
/// use courier::normalize;
///
/// assert_eq!(normalize("user@example.com").unwrap(), "user@example.com");
/// assert_eq!(normalize("user@тест.рф").unwrap(), "user@xn--e1aybc.xn--p1ai");
/// assert!(normalize("not-an-address").is_err());
/// ```
pub fn normalize(addr: &str) -> Result<String, MailError> {
    if addr.is_empty() {
        return Ok(String::new());
    }

    if let Err(e) = addr.parse::<EmailAddress>() {
        return Err(MailError::InvalidAddress(format!("'{addr}': {e}")));
    }

    Ok(encode_domain(addr))
}

/// Normalize every non-blank entry, preserving order.
///
/// Blank and whitespace-only entries are dropped before validation.
/// Duplicates pass through untouched.
pub fn normalize_many<I, S>(addrs: I) -> Result<Vec<String>, MailError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    addrs
        .into_iter()
        .filter(|a| !a.as_ref().trim().is_empty())
        .map(|a| normalize(a.as_ref()))
        .collect()
}

/// Rewrite the domain (after the last `@`) to its IDNA ASCII form.
///
/// Encoding failure is non-fatal: the address keeps its original domain and
/// a warning is logged, since some relays accept raw UTF-8 domains via
/// SMTPUTF8 and dropping the message here would hide that option.
fn encode_domain(addr: &str) -> String {
    let Some(at) = addr.rfind('@') else {
        return addr.to_string();
    };
    let (local, domain) = (&addr[..at], &addr[at + 1..]);
    if domain.is_ascii() {
        return addr.to_string();
    }
    match idna::domain_to_ascii(domain) {
        Ok(ascii) => format!("{local}@{ascii}"),
        Err(e) => {
            tracing::warn!(
                domain = %domain,
                error = ?e,
                "IDNA encoding failed, sending with original domain"
            );
            addr.to_string()
        }
    }
}

/// Conversion into an ordered recipient list.
///
/// Builder methods on [`Message`](crate::Message) accept either a single
/// address or a collection through this trait:
///
/// ```
/// use courier::Message;
///
/// let single = Message::new().to("a@example.com");
/// let many = Message::new().to(vec!["a@example.com", "b@example.com"]);
/// assert_eq!(single.to.len(), 1);
/// assert_eq!(many.to.len(), 2);
/// ```
pub trait Recipients {
    fn into_list(self) -> Vec<String>;
}

impl Recipients for &str {
    fn into_list(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl Recipients for String {
    fn into_list(self) -> Vec<String> {
        vec![self]
    }
}

impl Recipients for &String {
    fn into_list(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl Recipients for Vec<String> {
    fn into_list(self) -> Vec<String> {
        self
    }
}

impl Recipients for Vec<&str> {
    fn into_list(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl Recipients for &[&str] {
    fn into_list(self) -> Vec<String> {
        self.iter().map(|a| a.to_string()).collect()
    }
}

impl Recipients for &[String] {
    fn into_list(self) -> Vec<String> {
        self.to_vec()
    }
}

impl<const N: usize> Recipients for [&str; N] {
    fn into_list(self) -> Vec<String> {
        self.iter().map(|a| a.to_string()).collect()
    }
}
